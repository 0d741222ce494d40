//! Admin operations on other accounts.

use std::sync::Arc;

use patente_core::Clock;
use patente_core::model::{AdminPermissions, User, UserId, UserRole};
use storage::repository::{StorageError, TokenRepository, UserRepository};

use crate::auth::resolve_user;
use crate::error::AdminServiceError;

/// Use-case layer for moderation: roles, permission grants, verification.
///
/// Every operation requires the caller to hold the admin role; holding
/// individual grants is not enough.
#[derive(Clone)]
pub struct AdminService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
}

impl AdminService {
    #[must_use]
    pub fn new(
        clock: Clock,
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
    ) -> Self {
        Self {
            clock,
            users,
            tokens,
        }
    }

    /// Sets an account's role. When `permissions` is given the grant set is
    /// replaced along with it; otherwise the existing grants stay untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AdminServiceError::Forbidden`] for non-admin callers,
    /// [`AdminServiceError::UserNotFound`] for a missing target, an
    /// authorization error, or storage errors.
    pub async fn set_role(
        &self,
        token: &str,
        target: UserId,
        role: UserRole,
        permissions: Option<AdminPermissions>,
    ) -> Result<(), AdminServiceError> {
        let admin = self.require_admin(token).await?;
        let mut user = self.get_target(target).await?;
        user.role = role;
        if let Some(permissions) = permissions {
            user.admin_permissions = Some(permissions);
        }
        self.users.put_user(&user).await?;
        tracing::info!(
            admin = %admin.username,
            target = %user.username,
            role = role.as_str(),
            "role updated"
        );
        Ok(())
    }

    /// Replaces an account's permission grants.
    ///
    /// # Errors
    ///
    /// Returns [`AdminServiceError::Forbidden`] for non-admin callers,
    /// [`AdminServiceError::UserNotFound`] for a missing target, an
    /// authorization error, or storage errors.
    pub async fn set_admin_permissions(
        &self,
        token: &str,
        target: UserId,
        permissions: AdminPermissions,
    ) -> Result<(), AdminServiceError> {
        let admin = self.require_admin(token).await?;
        let mut user = self.get_target(target).await?;
        user.admin_permissions = Some(permissions);
        self.users.put_user(&user).await?;
        tracing::info!(
            admin = %admin.username,
            target = %user.username,
            "permissions updated"
        );
        Ok(())
    }

    /// Sets or clears an account's verified badge.
    ///
    /// # Errors
    ///
    /// Returns [`AdminServiceError::Forbidden`] for non-admin callers,
    /// [`AdminServiceError::UserNotFound`] for a missing target, an
    /// authorization error, or storage errors.
    pub async fn set_verified(
        &self,
        token: &str,
        target: UserId,
        verified: bool,
    ) -> Result<(), AdminServiceError> {
        let admin = self.require_admin(token).await?;
        let mut user = self.get_target(target).await?;
        user.is_verified = verified;
        self.users.put_user(&user).await?;
        tracing::info!(
            admin = %admin.username,
            target = %user.username,
            verified,
            "verification updated"
        );
        Ok(())
    }

    async fn require_admin(&self, token: &str) -> Result<User, AdminServiceError> {
        let caller = resolve_user(
            self.users.as_ref(),
            self.tokens.as_ref(),
            token,
            self.clock.now(),
        )
        .await?;
        if !caller.role.is_admin() {
            return Err(AdminServiceError::Forbidden);
        }
        Ok(caller)
    }

    async fn get_target(&self, target: UserId) -> Result<User, AdminServiceError> {
        match self.users.get_user(target).await {
            Ok(user) => Ok(user),
            Err(StorageError::NotFound) => Err(AdminServiceError::UserNotFound),
            Err(err) => Err(err.into()),
        }
    }
}
