use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{LikeId, PostId, UserId, VoteId};
use crate::model::text::{CleanText, TextError};
use crate::model::user::User;

/// Character cap for post bodies.
pub const POST_BODY_MAX_CHARS: usize = 2000;
/// Character cap for poll questions.
pub const POLL_QUESTION_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Regular,
    Poll,
}

impl PostKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Regular => "regular",
            PostKind::Poll => "poll",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "regular" => Some(PostKind::Regular),
            "poll" => Some(PostKind::Poll),
            _ => None,
        }
    }
}

/// Running vote tally of a poll. Votes land in `correct` or `incorrect`
/// depending on whether the voter matched the poll's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollTally {
    pub correct: u32,
    pub incorrect: u32,
}

impl PollTally {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct + self.incorrect
    }

    /// Counts one vote into the matching bucket.
    pub fn record(&mut self, was_correct: bool) {
        if was_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }
}

/// Poll payload of a true/false community question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetails {
    pub question: String,
    pub correct_answer: bool,
    pub tally: PollTally,
}

/// A community feed entry. `poll` present iff this is a poll post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    /// Display name snapshot taken at creation time.
    pub author_name: String,
    /// Avatar snapshot; kept in sync by avatar propagation.
    pub author_avatar: String,
    pub content: String,
    pub image: Option<String>,
    pub likes_count: u32,
    pub comments_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub poll: Option<PollDetails>,
}

impl Post {
    #[must_use]
    pub fn kind(&self) -> PostKind {
        if self.poll.is_some() {
            PostKind::Poll
        } else {
            PostKind::Regular
        }
    }
}

/// One user's answer to a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVote {
    pub id: VoteId,
    pub post_id: PostId,
    pub voter_id: UserId,
    pub answer: bool,
    pub created_at: DateTime<Utc>,
}

/// A like edge; posts carry the denormalized count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: LikeId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

// ─── Drafts ────────────────────────────────────────────────────────────────────

/// Raw input for a regular post.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDraft {
    pub content: String,
    pub image: Option<String>,
}

impl PostDraft {
    /// Sanitizes and length-checks the body.
    ///
    /// # Errors
    ///
    /// Returns a [`TextError`] when the body is empty after sanitization or
    /// over [`POST_BODY_MAX_CHARS`].
    pub fn validate(self) -> Result<ValidatedPost, TextError> {
        let content = CleanText::parse(self.content, POST_BODY_MAX_CHARS)?;
        Ok(ValidatedPost {
            content,
            image: self.image,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedPost {
    content: CleanText,
    image: Option<String>,
}

impl ValidatedPost {
    /// Materializes the post with a snapshot of the author's name and avatar.
    #[must_use]
    pub fn into_post(self, id: PostId, author: &User, now: DateTime<Utc>) -> Post {
        Post {
            id,
            author_id: author.id,
            author_name: author.display_name(),
            author_avatar: author.avatar.clone(),
            content: self.content.into_string(),
            image: self.image,
            likes_count: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
            poll: None,
        }
    }
}

/// Raw input for a poll post. The explanation becomes the feed content shown
/// alongside the question.
#[derive(Debug, Clone, Deserialize)]
pub struct PollDraft {
    pub question: String,
    pub correct_answer: bool,
    pub explanation: String,
}

impl PollDraft {
    /// Sanitizes and length-checks the question and the explanation.
    ///
    /// # Errors
    ///
    /// Returns a [`TextError`] when either text is empty after sanitization,
    /// the question is over [`POLL_QUESTION_MAX_CHARS`], or the explanation is
    /// over [`POST_BODY_MAX_CHARS`].
    pub fn validate(self) -> Result<ValidatedPoll, TextError> {
        let question = CleanText::parse(self.question, POLL_QUESTION_MAX_CHARS)?;
        let explanation = CleanText::parse(self.explanation, POST_BODY_MAX_CHARS)?;
        Ok(ValidatedPoll {
            question,
            correct_answer: self.correct_answer,
            explanation,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedPoll {
    question: CleanText,
    correct_answer: bool,
    explanation: CleanText,
}

impl ValidatedPoll {
    /// Materializes the poll post with a zeroed tally.
    #[must_use]
    pub fn into_post(self, id: PostId, author: &User, now: DateTime<Utc>) -> Post {
        Post {
            id,
            author_id: author.id,
            author_name: author.display_name(),
            author_avatar: author.avatar.clone(),
            content: self.explanation.into_string(),
            image: None,
            likes_count: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
            poll: Some(PollDetails {
                question: self.question.into_string(),
                correct_answer: self.correct_answer,
                tally: PollTally::default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::{UserDraft, Username};
    use crate::model::{PostId, UserId};
    use crate::time::fixed_now;

    fn author() -> User {
        UserDraft {
            first_name: "Lina".to_string(),
            last_name: "Nasser".to_string(),
            email: "lina@example.com".to_string(),
            password: "secret1".to_string(),
        }
        .validate()
        .unwrap()
        .into_user(
            UserId::generate(),
            Username::with_suffix("Lina", "Nasser", 1),
            "hash".to_string(),
            fixed_now(),
        )
    }

    #[test]
    fn test_regular_post_from_draft() {
        let post = PostDraft {
            content: "  first <b>post</b>  ".to_string(),
            image: None,
        }
        .validate()
        .unwrap()
        .into_post(PostId::generate(), &author(), fixed_now());
        assert_eq!(post.content, "first post");
        assert_eq!(post.author_name, "Lina Nasser");
        assert_eq!(post.kind(), PostKind::Regular);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 0);
    }

    #[test]
    fn test_empty_body_rejected() {
        let result = PostDraft {
            content: " <img src=x> ".to_string(),
            image: None,
        }
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_poll_post_starts_with_zero_tally() {
        let post = PollDraft {
            question: "Precedence at an unmarked crossing goes right?".to_string(),
            correct_answer: true,
            explanation: "Vehicles coming from the right have precedence.".to_string(),
        }
        .validate()
        .unwrap()
        .into_post(PostId::generate(), &author(), fixed_now());
        assert_eq!(post.kind(), PostKind::Poll);
        assert_eq!(post.content, "Vehicles coming from the right have precedence.");
        let poll = post.poll.unwrap();
        assert_eq!(poll.tally, PollTally::default());
        assert!(poll.correct_answer);
        assert_eq!(
            poll.question,
            "Precedence at an unmarked crossing goes right?"
        );
    }

    #[test]
    fn test_poll_needs_explanation() {
        let result = PollDraft {
            question: "Is 130 km/h the motorway limit for cars?".to_string(),
            correct_answer: true,
            explanation: "  ".to_string(),
        }
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_tally_buckets_by_correctness() {
        let mut tally = PollTally::default();
        tally.record(true);
        tally.record(true);
        tally.record(false);
        assert_eq!(tally.correct, 2);
        assert_eq!(tally.incorrect, 1);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_post_serializes_camel_case() {
        let post = PostDraft {
            content: "hello".to_string(),
            image: None,
        }
        .validate()
        .unwrap()
        .into_post(PostId::generate(), &author(), fixed_now());
        let json = serde_json::to_string(&post).unwrap();
        assert!(json.contains("\"authorName\":\"Lina Nasser\""));
        assert!(json.contains("\"likesCount\":0"));
        assert!(json.contains("\"poll\":null"));
    }

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in [PostKind::Regular, PostKind::Poll] {
            assert_eq!(PostKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(PostKind::parse("story"), None);
    }
}
