use std::collections::HashMap;

use patente_core::model::{Follow, User, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{USER_COLUMNS, map_follow_row, map_user_row, ser, write_error};
use crate::repository::{FollowRepository, StorageError};

#[async_trait::async_trait]
impl FollowRepository for SqliteRepository {
    async fn create_follow(&self, follow: &Follow) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // The unique pair constraint rejects a second edge; the foreign keys
        // reject edges to missing accounts.
        sqlx::query(
            "INSERT INTO follows (id, follower_id, following_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(follow.id.value().to_string())
        .bind(follow.follower_id.value().to_string())
        .bind(follow.following_id.value().to_string())
        .bind(follow.created_at)
        .execute(&mut *tx)
        .await
        .map_err(write_error)?;

        sqlx::query("UPDATE users SET following_count = following_count + 1 WHERE id = ?1")
            .bind(follow.follower_id.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("UPDATE users SET followers_count = followers_count + 1 WHERE id = ?1")
            .bind(follow.following_id.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn delete_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let res = sqlx::query("DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2")
            .bind(follower.value().to_string())
            .bind(following.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("UPDATE users SET following_count = MAX(following_count - 1, 0) WHERE id = ?1")
            .bind(follower.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query("UPDATE users SET followers_count = MAX(followers_count - 1, 0) WHERE id = ?1")
            .bind(following.value().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn find_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<Option<Follow>, StorageError> {
        let row = sqlx::query(
            "SELECT id, follower_id, following_id, created_at
             FROM follows WHERE follower_id = ?1 AND following_id = ?2",
        )
        .bind(follower.value().to_string())
        .bind(following.value().to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_follow_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn followers_of(&self, user: UserId) -> Result<Vec<User>, StorageError> {
        let edges = sqlx::query(
            "SELECT follower_id FROM follows WHERE following_id = ?1 ORDER BY created_at ASC",
        )
        .bind(user.value().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(edges.len());
        for row in &edges {
            ids.push(row.try_get::<String, _>("follower_id").map_err(ser)?);
        }
        self.users_in_edge_order(&ids).await
    }

    async fn following_of(&self, user: UserId) -> Result<Vec<User>, StorageError> {
        let edges = sqlx::query(
            "SELECT following_id FROM follows WHERE follower_id = ?1 ORDER BY created_at ASC",
        )
        .bind(user.value().to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut ids = Vec::with_capacity(edges.len());
        for row in &edges {
            ids.push(row.try_get::<String, _>("following_id").map_err(ser)?);
        }
        self.users_in_edge_order(&ids).await
    }
}

impl SqliteRepository {
    /// Fetch users by id and return them in the order of `ids`.
    async fn users_in_edge_order(&self, ids: &[String]) -> Result<Vec<User>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut by_id = HashMap::with_capacity(rows.len());
        for row in &rows {
            let user = map_user_row(row)?;
            by_id.insert(user.id.value().to_string(), user);
        }
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
