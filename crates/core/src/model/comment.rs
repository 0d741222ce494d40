use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{CommentId, PostId, UserId};
use crate::model::text::{CleanText, TextError};
use crate::model::user::User;

/// Character cap for comment bodies.
pub const COMMENT_BODY_MAX_CHARS: usize = 2000;

/// A comment under a post; the post carries the denormalized count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_avatar: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Raw comment input.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentDraft {
    pub content: String,
}

impl CommentDraft {
    /// Sanitizes and length-checks the body.
    ///
    /// # Errors
    ///
    /// Returns a [`TextError`] when the body is empty after sanitization or
    /// over [`COMMENT_BODY_MAX_CHARS`].
    pub fn validate(self) -> Result<ValidatedComment, TextError> {
        let content = CleanText::parse(self.content, COMMENT_BODY_MAX_CHARS)?;
        Ok(ValidatedComment { content })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedComment {
    content: CleanText,
}

impl ValidatedComment {
    /// Materializes the comment with a snapshot of the author's name and
    /// avatar.
    #[must_use]
    pub fn into_comment(
        self,
        id: CommentId,
        post_id: PostId,
        author: &User,
        now: DateTime<Utc>,
    ) -> Comment {
        Comment {
            id,
            post_id,
            author_id: author.id,
            author_name: author.display_name(),
            author_avatar: author.avatar.clone(),
            content: self.content.into_string(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::{UserDraft, Username};
    use crate::model::{TextError, UserId};
    use crate::time::fixed_now;

    fn author() -> User {
        UserDraft {
            first_name: "Omar".to_string(),
            last_name: "Said".to_string(),
            email: "omar@example.com".to_string(),
            password: "secret1".to_string(),
        }
        .validate()
        .unwrap()
        .into_user(
            UserId::generate(),
            Username::with_suffix("Omar", "Said", 5),
            "hash".to_string(),
            fixed_now(),
        )
    }

    #[test]
    fn test_comment_from_draft_snapshots_author() {
        let comment = CommentDraft {
            content: "<i>well</i> done".to_string(),
        }
        .validate()
        .unwrap()
        .into_comment(CommentId::generate(), PostId::generate(), &author(), fixed_now());
        assert_eq!(comment.content, "well done");
        assert_eq!(comment.author_name, "Omar Said");
        assert_eq!(comment.author_avatar, "");
    }

    #[test]
    fn test_blank_comment_rejected() {
        let result = CommentDraft {
            content: "   ".to_string(),
        }
        .validate();
        assert_eq!(result.unwrap_err(), TextError::Empty);
    }
}
