//! Message repository implementation
//!
//! PostgreSQL-backed storage for SMS messages. Delivery receipts update the
//! status column keyed by the carrier message sid.

use async_trait::async_trait;
use chibi_core::{
    models::Message,
    traits::{MessageRepository, Repository},
    AppError, AppResult,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of MessageRepository
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MESSAGE_SELECT_COLUMNS: &str = r#"
    id, sid, from_number, to_number, body, status, user_id, created_at
"#;

#[async_trait]
impl Repository<Message, i64> for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Message>> {
        let query = format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, MessageRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding message {}: {}", id, e);
                AppError::Database(format!("Failed to find message: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Message>> {
        let query = format!(
            "SELECT {} FROM messages ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            MESSAGE_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, MessageRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding messages: {}", e);
                AppError::Database(format!("Failed to fetch messages: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting messages: {}", e);
                AppError::Database(format!("Failed to count messages: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Message) -> AppResult<Message> {
        debug!("Creating message: {}", entity.sid);

        let query = format!(
            r#"
            INSERT INTO messages (sid, from_number, to_number, body, status, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MESSAGE_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, MessageRow>(&query)
            .bind(&entity.sid)
            .bind(&entity.from_number)
            .bind(&entity.to_number)
            .bind(&entity.body)
            .bind(&entity.status)
            .bind(entity.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating message: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::AlreadyExists(format!("Message {} already exists", entity.sid))
                } else {
                    AppError::Database(format!("Failed to create message: {}", e))
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Message) -> AppResult<Message> {
        let query = format!(
            r#"
            UPDATE messages
            SET sid = $2,
                from_number = $3,
                to_number = $4,
                body = $5,
                status = $6,
                user_id = $7
            WHERE id = $1
            RETURNING {}
            "#,
            MESSAGE_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, MessageRow>(&query)
            .bind(entity.id)
            .bind(&entity.sid)
            .bind(&entity.from_number)
            .bind(&entity.to_number)
            .bind(&entity.body)
            .bind(&entity.status)
            .bind(entity.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating message {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update message: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting message {}: {}", id, e);
                AppError::Database(format!("Failed to delete message: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_sid(&self, sid: &str) -> AppResult<Option<Message>> {
        let query = format!(
            "SELECT {} FROM messages WHERE sid = $1",
            MESSAGE_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, MessageRow>(&query)
            .bind(sid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding message by sid: {}", e);
                AppError::Database(format!("Failed to find message: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn update_status(&self, sid: &str, status: &str) -> AppResult<Option<Message>> {
        debug!("Updating message {} status to {}", sid, status);

        let query = format!(
            "UPDATE messages SET status = $2 WHERE sid = $1 RETURNING {}",
            MESSAGE_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, MessageRow>(&query)
            .bind(sid)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating message status: {}", e);
                AppError::Database(format!("Failed to update message status: {}", e))
            })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sid: String,
    from_number: String,
    to_number: String,
    body: String,
    status: String,
    user_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sid: row.sid,
            from_number: row.from_number,
            to_number: row.to_number,
            body: row.body,
            status: row.status,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chibi_core::models::message::status;

    #[test]
    fn test_message_row_conversion() {
        let row = MessageRow {
            id: 1,
            sid: "SM1234".to_string(),
            from_number: "+819011112222".to_string(),
            to_number: "+818033334444".to_string(),
            body: "hello".to_string(),
            status: status::RECEIVED.to_string(),
            user_id: Some(42),
            created_at: Utc::now(),
        };

        let msg: Message = row.into();
        assert_eq!(msg.sid, "SM1234");
        assert_eq!(msg.status, status::RECEIVED);
        assert_eq!(msg.user_id, Some(42));
    }
}
