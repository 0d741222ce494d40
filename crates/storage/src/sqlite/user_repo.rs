use patente_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{USER_COLUMNS, map_user_row, to_json, write_error};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let admin_permissions = match user.admin_permissions.as_ref() {
            Some(grants) => Some(to_json(grants)?),
            None => None,
        };
        let personal_info = to_json(&user.personal_info)?;
        let progress = to_json(&user.progress)?;
        let settings = to_json(&user.settings)?;

        sqlx::query(
            r"
            INSERT INTO users (id, email, username, password_hash, first_name, last_name, avatar,
                role, admin_permissions, is_verified, is_banned, created_at, last_login,
                personal_info, progress, settings, following_count, followers_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ",
        )
        .bind(user.id.value().to_string())
        .bind(user.email.as_str())
        .bind(user.username.as_str())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .bind(user.role.as_str())
        .bind(admin_permissions)
        .bind(user.is_verified)
        .bind(user.is_banned)
        .bind(user.created_at)
        .bind(user.last_login)
        .bind(personal_info)
        .bind(progress)
        .bind(settings)
        .bind(i64::from(user.following_count))
        .bind(i64::from(user.followers_count))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn put_user(&self, user: &User) -> Result<(), StorageError> {
        let admin_permissions = match user.admin_permissions.as_ref() {
            Some(grants) => Some(to_json(grants)?),
            None => None,
        };
        let personal_info = to_json(&user.personal_info)?;
        let progress = to_json(&user.progress)?;
        let settings = to_json(&user.settings)?;

        // created_at is fixed at insert time; everything else may change.
        let res = sqlx::query(
            r"
            UPDATE users SET
                email = ?2,
                username = ?3,
                password_hash = ?4,
                first_name = ?5,
                last_name = ?6,
                avatar = ?7,
                role = ?8,
                admin_permissions = ?9,
                is_verified = ?10,
                is_banned = ?11,
                last_login = ?12,
                personal_info = ?13,
                progress = ?14,
                settings = ?15,
                following_count = ?16,
                followers_count = ?17
            WHERE id = ?1
            ",
        )
        .bind(user.id.value().to_string())
        .bind(user.email.as_str())
        .bind(user.username.as_str())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar)
        .bind(user.role.as_str())
        .bind(admin_permissions)
        .bind(user.is_verified)
        .bind(user.is_banned)
        .bind(user.last_login)
        .bind(personal_info)
        .bind(progress)
        .bind(settings)
        .bind(i64::from(user.following_count))
        .bind(i64::from(user.followers_count))
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, StorageError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id.value().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_user_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_user_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_user_row(&row).map(Some),
            None => Ok(None),
        }
    }
}
