//! Account maintenance: credentials, settings, avatar, profile views.

use std::sync::Arc;

use patente_core::Clock;
use patente_core::model::{
    EmailAddress, EmailKind, MIN_PASSWORD_CHARS, User, UserError, UserId, UserProfile,
    UserSettings,
};
use storage::repository::{PostRepository, StorageError, TokenRepository, UserRepository};

use crate::auth::resolve_user;
use crate::error::AccountServiceError;
use crate::mailer::{Mailer, OutgoingEmail};
use crate::password::{hash_password, verify_password};

/// Use-case layer for everything a signed-in account changes about itself.
#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    tokens: Arc<dyn TokenRepository>,
    mailer: Arc<dyn Mailer>,
}

impl AccountService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        tokens: Arc<dyn TokenRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            clock,
            users,
            posts,
            tokens,
            mailer,
        }
    }

    /// Replaces the password after verifying the current one, then records a
    /// notification email. Existing sessions stay valid.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::WrongPassword`] when the current
    /// password does not match, [`AccountServiceError::Validation`] when the
    /// new one is too short, an authorization error, or storage errors.
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountServiceError> {
        let mut user = self.resolve(token).await?;
        if !verify_password(current_password, &user.password_hash) {
            return Err(AccountServiceError::WrongPassword);
        }
        if new_password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(UserError::PasswordTooShort.into());
        }

        user.password_hash = hash_password(new_password);
        self.users.put_user(&user).await?;

        let to = user.email.as_str().to_string();
        self.notify(&to, &user, EmailKind::PasswordChange).await;
        tracing::info!(user = %user.username, "password changed");
        Ok(())
    }

    /// Moves the account to a new email address and notifies both the old
    /// and the new one.
    ///
    /// Re-setting the address an account already holds is allowed; only a
    /// different account holding it is a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::Validation`] for a malformed address,
    /// [`AccountServiceError::EmailTaken`] when another account holds it, an
    /// authorization error, or storage errors.
    pub async fn change_email(
        &self,
        token: &str,
        new_email: &str,
    ) -> Result<(), AccountServiceError> {
        let mut user = self.resolve(token).await?;
        let parsed = EmailAddress::parse(new_email)?;
        if let Some(existing) = self.users.find_by_email(parsed.as_str()).await? {
            if existing.id != user.id {
                return Err(AccountServiceError::EmailTaken);
            }
        }

        let old_email = user.email.as_str().to_string();
        user.email = parsed;
        self.users.put_user(&user).await?;

        let new_email = user.email.as_str().to_string();
        self.notify(&old_email, &user, EmailKind::EmailChange).await;
        self.notify(&new_email, &user, EmailKind::EmailChange).await;
        tracing::info!(user = %user.username, "email changed");
        Ok(())
    }

    /// Replaces the whole settings record.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn update_settings(
        &self,
        token: &str,
        settings: UserSettings,
    ) -> Result<(), AccountServiceError> {
        let mut user = self.resolve(token).await?;
        user.settings = settings;
        self.users.put_user(&user).await?;
        Ok(())
    }

    /// Sets the avatar and rewrites the author snapshot on all of the user's
    /// posts and comments. Returns how many content records were touched.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn update_avatar(
        &self,
        token: &str,
        avatar: String,
    ) -> Result<u64, AccountServiceError> {
        let mut user = self.resolve(token).await?;
        user.avatar = avatar;
        self.users.put_user(&user).await?;
        let touched = self.posts.set_author_avatar(user.id, &user.avatar).await?;
        tracing::info!(user = %user.username, touched, "avatar updated");
        Ok(touched)
    }

    /// Clears the avatar, propagating the empty value the same way.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn delete_avatar(&self, token: &str) -> Result<u64, AccountServiceError> {
        self.update_avatar(token, String::new()).await
    }

    /// The caller's own profile.
    ///
    /// # Errors
    ///
    /// Returns an authorization error or storage errors.
    pub async fn profile(&self, token: &str) -> Result<UserProfile, AccountServiceError> {
        let user = self.resolve(token).await?;
        Ok(user.profile())
    }

    /// Another account's public profile.
    ///
    /// # Errors
    ///
    /// Returns [`AccountServiceError::UserNotFound`] when no such account
    /// exists, or storage errors.
    pub async fn profile_of(&self, user_id: UserId) -> Result<UserProfile, AccountServiceError> {
        match self.users.get_user(user_id).await {
            Ok(user) => Ok(user.profile()),
            Err(StorageError::NotFound) => Err(AccountServiceError::UserNotFound),
            Err(err) => Err(err.into()),
        }
    }

    async fn resolve(&self, token: &str) -> Result<User, AccountServiceError> {
        let user = resolve_user(
            self.users.as_ref(),
            self.tokens.as_ref(),
            token,
            self.clock.now(),
        )
        .await?;
        Ok(user)
    }

    async fn notify(&self, to: &str, user: &User, kind: EmailKind) {
        let email = OutgoingEmail {
            to: to.to_string(),
            user_id: Some(user.id),
            kind,
            recipient_name: user.first_name.clone(),
        };
        if let Err(err) = self.mailer.send(&email).await {
            tracing::warn!(error = %err, kind = kind.as_str(), "notification email not delivered");
        }
    }
}
