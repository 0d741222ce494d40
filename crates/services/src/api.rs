//! The uniform response envelope hosts serialize at their boundary.
//!
//! Every API call answers with `{success, data?, error?}`. Services
//! themselves return typed `Result`s; this module converts them, pulling the
//! user-facing message off the error when it has one and falling back to the
//! calling operation's catch-all string otherwise.

use serde::Serialize;

use crate::error::UserFacing;

/// Success/error envelope for one API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Wraps a service result, using `fallback` for errors that carry no
    /// message of their own.
    #[must_use]
    pub fn from_result<E: UserFacing>(result: Result<T, E>, fallback: &'static str) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::fail(err.user_message().unwrap_or(fallback)),
        }
    }
}

/// Per-operation fallback messages, exactly as the product shows them.
pub mod messages {
    pub const REGISTER_FAILED: &str = "فشل التسجيل";
    pub const LOGIN_FAILED: &str = "فشل تسجيل الدخول";
    pub const LOGOUT_FAILED: &str = "فشل تسجيل الخروج";
    pub const CHECK_FAILED: &str = "فشل التحقق";
    pub const PASSWORD_CHANGE_FAILED: &str = "فشل تغيير كلمة المرور";
    pub const EMAIL_CHANGE_FAILED: &str = "فشل تغيير البريد الإلكتروني";
    pub const SETTINGS_UPDATE_FAILED: &str = "فشل تحديث الإعدادات";
    pub const AVATAR_UPDATE_FAILED: &str = "فشل تحديث الصورة";
    pub const AVATAR_DELETE_FAILED: &str = "فشل حذف الصورة";
    pub const PROFILE_FETCH_FAILED: &str = "فشل جلب الملف الشخصي";
    pub const PROGRESS_UPDATE_FAILED: &str = "فشل تحديث التقدم";
    pub const PERSONAL_INFO_UPDATE_FAILED: &str = "فشل تحديث البيانات الشخصية";
    pub const ACTIVITY_UPDATE_FAILED: &str = "فشل تحديث الحالة";
    pub const CONTENT_LOCK_CHECK_FAILED: &str = "فشل التحقق من قفل المحتوى";
    pub const READINESS_UPDATE_FAILED: &str = "فشل تحديث الجاهزية";
    pub const FOLLOW_FAILED: &str = "فشلت المتابعة";
    pub const UNFOLLOW_FAILED: &str = "فشل إلغاء المتابعة";
    pub const FOLLOWERS_FETCH_FAILED: &str = "فشل جلب المتابعين";
    pub const FOLLOWING_FETCH_FAILED: &str = "فشل جلب المتابَعين";
    pub const POST_CREATE_FAILED: &str = "فشل إنشاء المنشور";
    pub const POLL_CREATE_FAILED: &str = "فشل إنشاء السؤال";
    pub const POSTS_FETCH_FAILED: &str = "فشل جلب المنشورات";
    pub const COMMENT_CREATE_FAILED: &str = "فشل إنشاء التعليق";
    pub const VOTE_FAILED: &str = "فشل التصويت";
    pub const ROLE_UPDATE_FAILED: &str = "فشل تحديث الدور";
    pub const PERMISSIONS_UPDATE_FAILED: &str = "فشل تحديث الصلاحيات";
    pub const VERIFICATION_UPDATE_FAILED: &str = "فشل تحديث حالة التوثيق";
}
