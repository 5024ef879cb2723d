//! Phone call repository implementation
//!
//! PostgreSQL-backed storage for phone calls, including missed-call events.
//! Inbound CDR legs resolve their owning call through `find_by_call_uuid`.

use async_trait::async_trait;
use chibi_core::{
    models::PhoneCall,
    traits::{PhoneCallRepository, Repository},
    AppError, AppResult,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of PhoneCallRepository
pub struct PgPhoneCallRepository {
    pool: PgPool,
}

impl PgPhoneCallRepository {
    /// Create a new phone call repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CALL_SELECT_COLUMNS: &str = r#"
    id, call_uuid, from_number, to_number, status, user_id, created_at
"#;

#[async_trait]
impl Repository<PhoneCall, i64> for PgPhoneCallRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<Option<PhoneCall>> {
        let query = format!(
            "SELECT {} FROM phone_calls WHERE id = $1",
            CALL_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, PhoneCallRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding phone call {}: {}", id, e);
                AppError::Database(format!("Failed to find phone call: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<PhoneCall>> {
        let query = format!(
            "SELECT {} FROM phone_calls ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            CALL_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, PhoneCallRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding phone calls: {}", e);
                AppError::Database(format!("Failed to fetch phone calls: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM phone_calls")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting phone calls: {}", e);
                AppError::Database(format!("Failed to count phone calls: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &PhoneCall) -> AppResult<PhoneCall> {
        debug!("Creating phone call: {}", entity.call_uuid);

        let query = format!(
            r#"
            INSERT INTO phone_calls (call_uuid, from_number, to_number, status, user_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CALL_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, PhoneCallRow>(&query)
            .bind(&entity.call_uuid)
            .bind(&entity.from_number)
            .bind(&entity.to_number)
            .bind(&entity.status)
            .bind(entity.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating phone call: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::AlreadyExists(format!(
                        "Phone call {} already exists",
                        entity.call_uuid
                    ))
                } else {
                    AppError::Database(format!("Failed to create phone call: {}", e))
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &PhoneCall) -> AppResult<PhoneCall> {
        let query = format!(
            r#"
            UPDATE phone_calls
            SET call_uuid = $2,
                from_number = $3,
                to_number = $4,
                status = $5,
                user_id = $6
            WHERE id = $1
            RETURNING {}
            "#,
            CALL_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, PhoneCallRow>(&query)
            .bind(entity.id)
            .bind(&entity.call_uuid)
            .bind(&entity.from_number)
            .bind(&entity.to_number)
            .bind(&entity.status)
            .bind(entity.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating phone call {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update phone call: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM phone_calls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting phone call {}: {}", id, e);
                AppError::Database(format!("Failed to delete phone call: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PhoneCallRepository for PgPhoneCallRepository {
    #[instrument(skip(self))]
    async fn find_by_call_uuid(&self, call_uuid: &str) -> AppResult<Option<PhoneCall>> {
        let query = format!(
            "SELECT {} FROM phone_calls WHERE call_uuid = $1",
            CALL_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, PhoneCallRow>(&query)
            .bind(call_uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding phone call by UUID: {}", e);
                AppError::Database(format!("Failed to find phone call: {}", e))
            })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct PhoneCallRow {
    id: i64,
    call_uuid: String,
    from_number: String,
    to_number: String,
    status: String,
    user_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<PhoneCallRow> for PhoneCall {
    fn from(row: PhoneCallRow) -> Self {
        Self {
            id: row.id,
            call_uuid: row.call_uuid,
            from_number: row.from_number,
            to_number: row.to_number,
            status: row.status,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}
