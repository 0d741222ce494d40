use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{FollowId, UserId};

/// A directed follow edge. Unique per (follower, following) pair; both user
/// records carry denormalized counts maintained together with the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub id: FollowId,
    pub follower_id: UserId,
    pub following_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    /// Creates the edge `follower → following`.
    #[must_use]
    pub fn link(
        id: FollowId,
        follower_id: UserId,
        following_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            follower_id,
            following_id,
            created_at: now,
        }
    }
}
