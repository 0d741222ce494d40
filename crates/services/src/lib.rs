#![forbid(unsafe_code)]

pub mod account_service;
pub mod admin_service;
pub mod api;
pub mod app_services;
pub mod auth;
pub mod auth_service;
pub mod community_service;
pub mod error;
pub mod mailer;
pub mod password;
pub mod progress_service;
pub mod rate_limit;
pub mod social_service;

pub use patente_core::Clock;

pub use account_service::AccountService;
pub use admin_service::AdminService;
pub use api::ApiResponse;
pub use app_services::AppServices;
pub use auth::resolve_user;
pub use auth_service::{AuthService, Session};
pub use community_service::{CommunityService, VoteOutcome};
pub use error::{
    AccountServiceError, AdminServiceError, AppServicesError, AuthError, AuthServiceError,
    CommunityServiceError, MailerError, ProgressServiceError, SocialServiceError, UserFacing,
};
pub use mailer::{LogMailer, Mailer, OutgoingEmail, WebhookConfig, WebhookMailer};
pub use progress_service::{ProgressService, ReadinessReport};
pub use rate_limit::RateLimiter;
pub use social_service::SocialService;
