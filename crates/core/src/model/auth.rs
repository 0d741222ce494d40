use chrono::{DateTime, Utc};

use crate::model::ids::UserId;

/// An issued session token pair. Both strings are opaque random hex; the
/// record expires as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub refresh_token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AuthToken {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn token(expires_at: DateTime<Utc>) -> AuthToken {
        AuthToken {
            token: "aa".repeat(32),
            refresh_token: "bb".repeat(32),
            user_id: UserId::generate(),
            created_at: fixed_now(),
            expires_at,
        }
    }

    #[test]
    fn test_not_expired_before_deadline() {
        let t = token(fixed_now() + Duration::days(30));
        assert!(!t.is_expired(fixed_now()));
        assert!(!t.is_expired(fixed_now() + Duration::days(29)));
    }

    #[test]
    fn test_expired_at_and_after_deadline() {
        let deadline = fixed_now() + Duration::days(30);
        let t = token(deadline);
        assert!(t.is_expired(deadline));
        assert!(t.is_expired(deadline + Duration::seconds(1)));
    }
}
