use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::account_service::AccountService;
use crate::admin_service::AdminService;
use crate::auth_service::AuthService;
use crate::community_service::CommunityService;
use crate::error::AppServicesError;
use crate::mailer::{LogMailer, Mailer, WebhookConfig, WebhookMailer};
use crate::progress_service::ProgressService;
use crate::rate_limit::RateLimiter;
use crate::social_service::SocialService;

/// Assembles the app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    auth: Arc<AuthService>,
    accounts: Arc<AccountService>,
    progress: Arc<ProgressService>,
    social: Arc<SocialService>,
    community: Arc<CommunityService>,
    admin: Arc<AdminService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(&storage, clock))
    }

    /// Build services over in-memory storage. Nothing survives the process.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        let storage = Storage::in_memory();
        Self::with_storage(&storage, clock)
    }

    fn with_storage(storage: &Storage, clock: Clock) -> Self {
        // Webhook delivery only when the environment configures an endpoint.
        let mailer: Arc<dyn Mailer> = match WebhookConfig::from_env() {
            Some(config) => Arc::new(WebhookMailer::new(Some(config))),
            None => Arc::new(LogMailer::new(clock, Arc::clone(&storage.email_logs))),
        };
        let limiter = Arc::new(RateLimiter::default());

        let auth = Arc::new(AuthService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.tokens),
            Arc::clone(&mailer),
            limiter,
        ));
        let accounts = Arc::new(AccountService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.posts),
            Arc::clone(&storage.tokens),
            Arc::clone(&mailer),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.tokens),
        ));
        let social = Arc::new(SocialService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.follows),
            Arc::clone(&storage.tokens),
        ));
        let community = Arc::new(CommunityService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.posts),
            Arc::clone(&storage.tokens),
        ));
        let admin = Arc::new(AdminService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.tokens),
        ));

        Self {
            auth,
            accounts,
            progress,
            social,
            community,
            admin,
        }
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn accounts(&self) -> Arc<AccountService> {
        Arc::clone(&self.accounts)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn social(&self) -> Arc<SocialService> {
        Arc::clone(&self.social)
    }

    #[must_use]
    pub fn community(&self) -> Arc<CommunityService> {
        Arc::clone(&self.community)
    }

    #[must_use]
    pub fn admin(&self) -> Arc<AdminService> {
        Arc::clone(&self.admin)
    }
}
