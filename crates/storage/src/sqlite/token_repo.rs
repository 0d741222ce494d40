use patente_core::model::AuthToken;

use super::SqliteRepository;
use super::mapping::{map_token_row, write_error};
use crate::repository::{StorageError, TokenRepository};

#[async_trait::async_trait]
impl TokenRepository for SqliteRepository {
    async fn insert_token(&self, token: &AuthToken) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO auth_tokens (token, refresh_token, user_id, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(&token.token)
        .bind(&token.refresh_token)
        .bind(token.user_id.value().to_string())
        .bind(token.created_at)
        .bind(token.expires_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn get_token(&self, token: &str) -> Result<Option<AuthToken>, StorageError> {
        let row = sqlx::query(
            "SELECT token, refresh_token, user_id, created_at, expires_at
             FROM auth_tokens WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_token_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn delete_token(&self, token: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM auth_tokens WHERE token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
