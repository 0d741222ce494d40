use super::SqliteRepository;
use super::mapping::map_email_log_row;
use crate::repository::{EmailLogRecord, EmailLogRepository, StorageError};

#[async_trait::async_trait]
impl EmailLogRepository for SqliteRepository {
    async fn append_email_log(&self, record: &EmailLogRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO email_logs (user_id, email, kind, sent_at, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(record.user_id.map(|id| id.value().to_string()))
        .bind(&record.email)
        .bind(record.kind.as_str())
        .bind(record.sent_at)
        .bind(record.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn logs_for_email(&self, email: &str) -> Result<Vec<EmailLogRecord>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, user_id, email, kind, sent_at, status
             FROM email_logs WHERE email = ?1 ORDER BY id ASC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(map_email_log_row(row)?);
        }
        Ok(records)
    }
}
