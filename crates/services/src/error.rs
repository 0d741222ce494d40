//! Error types shared across the service layer.
//!
//! Every service gets its own enum so callers can match on exactly the
//! failures that operation can produce. Variants that carry one of the
//! product's Arabic messages implement [`UserFacing`]; everything else is an
//! internal failure that surfaces through the per-operation fallback string
//! (see `api::messages`).

use thiserror::Error;

use patente_core::model::{TextError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// An error that may carry one of the product's user-facing messages.
///
/// `None` means the error has no message of its own; the API boundary then
/// falls back to the calling operation's catch-all string.
pub trait UserFacing {
    fn user_message(&self) -> Option<&'static str>;
}

/// Failures while resolving a session token to its account.
///
/// Missing, unknown, and expired tokens are deliberately indistinguishable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("token is missing, unknown, or expired")]
    Unauthorized,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for AuthError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            AuthError::Unauthorized => Some("غير مصرح"),
            AuthError::Storage(_) => None,
        }
    }
}

/// Failures from registration, login, and the credential probes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthServiceError {
    #[error("email is already registered")]
    EmailTaken,

    #[error("username is already registered")]
    UsernameTaken,

    #[error("email or password does not match an account")]
    InvalidCredentials,

    #[error("account is banned")]
    Banned,

    #[error("too many attempts")]
    RateLimited,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Validation(#[from] UserError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for AuthServiceError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            AuthServiceError::EmailTaken => Some("البريد الإلكتروني مستخدم بالفعل"),
            AuthServiceError::UsernameTaken => Some("اسم المستخدم مستخدم بالفعل"),
            AuthServiceError::InvalidCredentials => {
                Some("البريد الإلكتروني أو كلمة المرور غير صحيحة")
            }
            AuthServiceError::Banned => Some("تم حظر هذا الحساب"),
            AuthServiceError::RateLimited => Some("محاولات كثيرة جداً، حاول مرة أخرى لاحقاً"),
            AuthServiceError::UserNotFound => Some("المستخدم غير موجود"),
            AuthServiceError::Auth(inner) => inner.user_message(),
            AuthServiceError::Validation(_) | AuthServiceError::Storage(_) => None,
        }
    }
}

/// Failures from account maintenance: password, email, settings, avatar,
/// profile reads.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountServiceError {
    #[error("current password does not match")]
    WrongPassword,

    #[error("email is already registered")]
    EmailTaken,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Validation(#[from] UserError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for AccountServiceError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            AccountServiceError::WrongPassword => Some("كلمة المرور الحالية غير صحيحة"),
            AccountServiceError::EmailTaken => Some("البريد الإلكتروني مستخدم بالفعل"),
            AccountServiceError::UserNotFound => Some("المستخدم غير موجود"),
            AccountServiceError::Auth(inner) => inner.user_message(),
            AccountServiceError::Validation(_) | AccountServiceError::Storage(_) => None,
        }
    }
}

/// Failures from progress, readiness, and content-lock updates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for ProgressServiceError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            ProgressServiceError::Auth(inner) => inner.user_message(),
            ProgressServiceError::Storage(_) => None,
        }
    }
}

/// Failures from the follow graph.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SocialServiceError {
    #[error("cannot follow yourself")]
    SelfFollow,

    #[error("already following this user")]
    AlreadyFollowing,

    #[error("not following this user")]
    NotFollowing,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for SocialServiceError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            SocialServiceError::SelfFollow => Some("لا يمكنك متابعة نفسك"),
            SocialServiceError::AlreadyFollowing => Some("تتابع هذا المستخدم بالفعل"),
            SocialServiceError::NotFollowing => Some("لا تتابع هذا المستخدم"),
            SocialServiceError::UserNotFound => Some("المستخدم غير موجود"),
            SocialServiceError::Auth(inner) => inner.user_message(),
            SocialServiceError::Storage(_) => None,
        }
    }
}

/// Failures from the community feed: posts, comments, polls, likes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommunityServiceError {
    #[error("post not found")]
    PostNotFound,

    #[error("user already voted on this poll")]
    AlreadyVoted,

    #[error("user already liked this post")]
    AlreadyLiked,

    #[error("user has not liked this post")]
    NotLiked,

    #[error(transparent)]
    Validation(#[from] TextError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for CommunityServiceError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            CommunityServiceError::PostNotFound => Some("السؤال غير موجود"),
            CommunityServiceError::AlreadyVoted => Some("لقد صوّت بالفعل"),
            CommunityServiceError::Auth(inner) => inner.user_message(),
            CommunityServiceError::AlreadyLiked
            | CommunityServiceError::NotLiked
            | CommunityServiceError::Validation(_)
            | CommunityServiceError::Storage(_) => None,
        }
    }
}

/// Failures from the admin operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdminServiceError {
    /// Caller is authenticated but not an admin.
    #[error("caller is not an admin")]
    Forbidden,

    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserFacing for AdminServiceError {
    fn user_message(&self) -> Option<&'static str> {
        match self {
            AdminServiceError::Forbidden => Some("غير مصرح"),
            AdminServiceError::UserNotFound => Some("المستخدم غير موجود"),
            AdminServiceError::Auth(inner) => inner.user_message(),
            AdminServiceError::Storage(_) => None,
        }
    }
}

/// Failures from email delivery. Never user-facing; sends are fire-and-forget
/// and callers log these at `warn`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MailerError {
    #[error("mail webhook is not configured")]
    Disabled,

    #[error("webhook request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures while wiring up the service container.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
