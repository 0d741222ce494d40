//! Registration, login, and session management.

use std::sync::Arc;

use rand::Rng;

use patente_core::Clock;
use patente_core::model::{EmailKind, User, UserDraft, UserId, UserProfile, Username};
use serde::Serialize;
use storage::repository::{TokenRepository, UserRepository};

use crate::auth::{issue_token, resolve_user};
use crate::error::AuthServiceError;
use crate::mailer::{Mailer, OutgoingEmail};
use crate::password::{hash_password, verify_password};
use crate::rate_limit::RateLimiter;

/// An authenticated session: the issued token pair plus the public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Use-case layer for accounts entering and leaving the app.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
    mailer: Arc<dyn Mailer>,
    limiter: Arc<RateLimiter>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        mailer: Arc<dyn Mailer>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            clock,
            users,
            tokens,
            mailer,
            limiter,
        }
    }

    /// Creates an account and signs it in.
    ///
    /// The caller may bring a username; otherwise one is generated from the
    /// names plus a random 4-digit suffix. Either way the handle is checked
    /// once and a collision rejects the registration. A welcome email is
    /// recorded after the account exists; its failure does not fail the
    /// registration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::RateLimited`] past the attempt budget,
    /// [`AuthServiceError::Validation`] for bad input,
    /// [`AuthServiceError::EmailTaken`] / [`AuthServiceError::UsernameTaken`]
    /// on collisions, or storage errors.
    pub async fn register(
        &self,
        draft: UserDraft,
        username: Option<String>,
    ) -> Result<Session, AuthServiceError> {
        let now = self.clock.now();
        let key = format!("register:{}", draft.email.trim().to_lowercase());
        if !self.limiter.check(&key, now) {
            return Err(AuthServiceError::RateLimited);
        }

        let validated = draft.validate()?;
        if self
            .users
            .find_by_email(validated.email().as_str())
            .await?
            .is_some()
        {
            return Err(AuthServiceError::EmailTaken);
        }

        let username = match username {
            Some(raw) => Username::parse(raw.trim())?,
            None => Username::with_suffix(
                validated.first_name(),
                validated.last_name(),
                random_suffix(),
            ),
        };
        if self
            .users
            .find_by_username(username.as_str())
            .await?
            .is_some()
        {
            return Err(AuthServiceError::UsernameTaken);
        }

        let password_hash = hash_password(validated.password());
        let user = validated.into_user(UserId::generate(), username, password_hash, now);
        self.users.insert_user(&user).await?;

        let token = issue_token(user.id, now);
        self.tokens.insert_token(&token).await?;

        self.notify(&user, EmailKind::Registration).await;
        tracing::info!(user = %user.username, "account registered");
        Ok(Session {
            token: token.token,
            refresh_token: token.refresh_token,
            user: user.profile(),
        })
    }

    /// Signs an existing account in and refreshes `last_login`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::RateLimited`] past the attempt budget,
    /// [`AuthServiceError::InvalidCredentials`] when the email or password
    /// does not match (indistinguishably), [`AuthServiceError::Banned`] for
    /// banned accounts, or storage errors.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthServiceError> {
        let now = self.clock.now();
        let normalized = email.trim().to_lowercase();
        if !self.limiter.check(&format!("login:{normalized}"), now) {
            return Err(AuthServiceError::RateLimited);
        }

        let Some(mut user) = self.users.find_by_email(&normalized).await? else {
            return Err(AuthServiceError::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            return Err(AuthServiceError::InvalidCredentials);
        }
        if user.is_banned {
            return Err(AuthServiceError::Banned);
        }

        user.last_login = now;
        self.users.put_user(&user).await?;

        let token = issue_token(user.id, now);
        self.tokens.insert_token(&token).await?;

        tracing::info!(user = %user.username, "signed in");
        Ok(Session {
            token: token.token,
            refresh_token: token.refresh_token,
            user: user.profile(),
        })
    }

    /// Discards a session token. Unknown tokens are ignored so the operation
    /// is idempotent.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.tokens.delete_token(token).await?;
        Ok(())
    }

    /// Resolves a session token to its public profile.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::AuthError::Unauthorized`] (wrapped) for
    /// missing, expired, or orphaned tokens, or storage errors.
    pub async fn authenticate(&self, token: &str) -> Result<UserProfile, AuthServiceError> {
        let user = self.resolve(token).await?;
        Ok(user.profile())
    }

    /// Whether an account holds this email (compared case-insensitively).
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn email_exists(&self, email: &str) -> Result<bool, AuthServiceError> {
        let found = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?;
        Ok(found.is_some())
    }

    /// Whether an account holds this username.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn username_exists(&self, username: &str) -> Result<bool, AuthServiceError> {
        let found = self.users.find_by_username(username.trim()).await?;
        Ok(found.is_some())
    }

    /// Checks a password against the account holding `email`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError::UserNotFound`] when no account holds the
    /// email, or storage errors.
    pub async fn verify_current_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<bool, AuthServiceError> {
        let Some(user) = self.users.find_by_email(&email.trim().to_lowercase()).await? else {
            return Err(AuthServiceError::UserNotFound);
        };
        Ok(verify_password(password, &user.password_hash))
    }

    async fn resolve(&self, token: &str) -> Result<User, AuthServiceError> {
        let user = resolve_user(
            self.users.as_ref(),
            self.tokens.as_ref(),
            token,
            self.clock.now(),
        )
        .await?;
        Ok(user)
    }

    async fn notify(&self, user: &User, kind: EmailKind) {
        let email = OutgoingEmail {
            to: user.email.as_str().to_string(),
            user_id: Some(user.id),
            kind,
            recipient_name: user.first_name.clone(),
        };
        if let Err(err) = self.mailer.send(&email).await {
            tracing::warn!(error = %err, kind = kind.as_str(), "notification email not delivered");
        }
    }
}

fn random_suffix() -> u16 {
    rand::rng().random_range(0..9999)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use patente_core::model::UserError;
    use patente_core::time::{fixed_clock, fixed_now};
    use storage::repository::{EmailLogRepository, Storage};

    use crate::mailer::LogMailer;

    fn draft(email: &str) -> UserDraft {
        UserDraft {
            first_name: "Sara".to_string(),
            last_name: "Haddad".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    fn build_service(storage: &Storage, clock: Clock) -> AuthService {
        let mailer = LogMailer::new(clock, Arc::clone(&storage.email_logs));
        AuthService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.tokens),
            Arc::new(mailer),
            Arc::new(RateLimiter::default()),
        )
    }

    #[tokio::test]
    async fn test_register_issues_tokens_and_records_a_welcome_email() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());

        let session = service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        assert_eq!(session.token.len(), 64);
        assert_ne!(session.token, session.refresh_token);
        assert_eq!(session.user.email.as_str(), "sara@example.com");
        assert!(session.user.username.as_str().starts_with("sarahaddad"));
        assert_eq!(session.user.username.as_str().len(), "sarahaddad".len() + 4);

        let logs = storage
            .email_logs
            .logs_for_email("sara@example.com")
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, EmailKind::Registration);

        let profile = service.authenticate(&session.token).await.unwrap();
        assert_eq!(profile.id, session.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_a_duplicate_email() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());
        service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        let err = service
            .register(draft("Sara@Example.com"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthServiceError::EmailTaken));
    }

    #[tokio::test]
    async fn test_register_accepts_a_chosen_username_once() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());

        let session = service
            .register(draft("sara@example.com"), Some("saracustom".to_string()))
            .await
            .unwrap();
        assert_eq!(session.user.username.as_str(), "saracustom");

        let err = service
            .register(draft("other@example.com"), Some("saracustom".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthServiceError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_register_rejects_a_malformed_username() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());

        let err = service
            .register(draft("sara@example.com"), Some("Sara!".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthServiceError::Validation(UserError::InvalidUsername)
        ));
    }

    #[tokio::test]
    async fn test_login_verifies_credentials_and_updates_last_login() {
        let storage = Storage::in_memory();
        let registered_at = fixed_now();
        build_service(&storage, Clock::fixed(registered_at))
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        let later = registered_at + Duration::hours(3);
        let service = build_service(&storage, Clock::fixed(later));
        let session = service.login("sara@example.com", "secret1").await.unwrap();
        assert_eq!(session.user.last_login, later);

        let stored = storage
            .users
            .find_by_email("sara@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_login, later);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials_indistinguishably() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());
        service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        let wrong_password = service
            .login("sara@example.com", "nope123")
            .await
            .unwrap_err();
        let unknown_email = service
            .login("nobody@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(
            wrong_password,
            AuthServiceError::InvalidCredentials
        ));
        assert!(matches!(unknown_email, AuthServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_rejects_banned_accounts() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());
        service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        let mut user = storage
            .users
            .find_by_email("sara@example.com")
            .await
            .unwrap()
            .unwrap();
        user.is_banned = true;
        storage.users.put_user(&user).await.unwrap();

        let err = service
            .login("sara@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthServiceError::Banned));
    }

    #[tokio::test]
    async fn test_login_attempts_are_rate_limited_per_email() {
        let storage = Storage::in_memory();
        let clock = fixed_clock();
        let mailer = LogMailer::new(clock, Arc::clone(&storage.email_logs));
        let service = AuthService::new(
            clock,
            Arc::clone(&storage.users),
            Arc::clone(&storage.tokens),
            Arc::new(mailer),
            Arc::new(RateLimiter::new(2, Duration::seconds(60))),
        );

        for _ in 0..2 {
            let err = service.login("sara@example.com", "nope").await.unwrap_err();
            assert!(matches!(err, AuthServiceError::InvalidCredentials));
        }
        let err = service.login("sara@example.com", "nope").await.unwrap_err();
        assert!(matches!(err, AuthServiceError::RateLimited));

        // A different account is unaffected.
        let err = service
            .login("other@example.com", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_logout_discards_the_session_and_is_idempotent() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());
        let session = service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        service.logout(&session.token).await.unwrap();
        let err = service.authenticate(&session.token).await.unwrap_err();
        assert!(matches!(err, AuthServiceError::Auth(_)));

        service.logout(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_existence_probes() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());
        let session = service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        assert!(service.email_exists("SARA@example.com").await.unwrap());
        assert!(!service.email_exists("other@example.com").await.unwrap());
        assert!(
            service
                .username_exists(session.user.username.as_str())
                .await
                .unwrap()
        );
        assert!(!service.username_exists("nobody0000").await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_current_password() {
        let storage = Storage::in_memory();
        let service = build_service(&storage, fixed_clock());
        service
            .register(draft("sara@example.com"), None)
            .await
            .unwrap();

        assert!(
            service
                .verify_current_password("sara@example.com", "secret1")
                .await
                .unwrap()
        );
        assert!(
            !service
                .verify_current_password("sara@example.com", "wrong")
                .await
                .unwrap()
        );
        let err = service
            .verify_current_password("nobody@example.com", "secret1")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthServiceError::UserNotFound));
    }
}
