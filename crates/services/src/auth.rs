//! Session-token plumbing shared by the services.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use patente_core::model::{AuthToken, User, UserId};
use storage::repository::{StorageError, TokenRepository, UserRepository};

use crate::error::AuthError;

/// How long an issued token pair stays valid.
pub const TOKEN_TTL_DAYS: i64 = 30;

const TOKEN_BYTES: usize = 32;

/// Mints an opaque token string: random bytes, hex encoded.
pub(crate) fn fresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues a token pair for `user` expiring [`TOKEN_TTL_DAYS`] from `now`.
pub(crate) fn issue_token(user: UserId, now: DateTime<Utc>) -> AuthToken {
    AuthToken {
        token: fresh_token(),
        refresh_token: fresh_token(),
        user_id: user,
        created_at: now,
        expires_at: now + Duration::days(TOKEN_TTL_DAYS),
    }
}

/// Resolves a presented token to its account.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] when the token is unknown or expired,
/// or when the account behind it no longer exists; storage failures pass
/// through.
pub async fn resolve_user(
    users: &dyn UserRepository,
    tokens: &dyn TokenRepository,
    token: &str,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let Some(record) = tokens.get_token(token).await? else {
        return Err(AuthError::Unauthorized);
    };
    if record.is_expired(now) {
        return Err(AuthError::Unauthorized);
    }
    match users.get_user(record.user_id).await {
        Ok(user) => Ok(user),
        Err(StorageError::NotFound) => Err(AuthError::Unauthorized),
        Err(err) => Err(AuthError::Storage(err)),
    }
}
