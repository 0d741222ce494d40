mod auth;
mod comment;
mod email;
mod follow;
mod ids;
mod personal;
mod post;
mod progress;
mod role;
mod settings;
mod text;
mod user;

pub use auth::AuthToken;
pub use comment::{COMMENT_BODY_MAX_CHARS, Comment, CommentDraft, ValidatedComment};
pub use email::{EmailKind, EmailStatus};
pub use follow::Follow;
pub use ids::{
    CommentId, FollowId, LessonId, LikeId, ParseIdError, PostId, TopicId, UserId, VoteId,
};
pub use personal::{Gender, ItalianLevel, PersonalInfo};
pub use post::{
    Like, POLL_QUESTION_MAX_CHARS, POST_BODY_MAX_CHARS, PollDetails, PollDraft, PollTally,
    PollVote, Post, PostDraft, PostKind, ValidatedPoll, ValidatedPost,
};
pub use progress::{ActivityKind, UserProgress};
pub use role::{AdminPermissions, Permission, UserRole};
pub use settings::{FontSize, Language, Theme, UserSettings};
pub use text::{CleanText, TextError};
pub use user::{
    EmailAddress, MIN_PASSWORD_CHARS, User, UserDraft, UserError, UserProfile, Username,
    ValidatedUser,
};
