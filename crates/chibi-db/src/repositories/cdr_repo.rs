//! CDR (Call Data Record) repository implementation
//!
//! Provides PostgreSQL-backed storage for call data records, including the
//! inbound-leg lookup used for bridge resolution. Uses runtime queries (not
//! compile-time macros) to avoid requiring a database connection at build
//! time.

use async_trait::async_trait;
use chibi_core::{
    models::Cdr,
    traits::{CdrRepository, Repository},
    AppError, AppResult,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of CdrRepository
pub struct PgCdrRepository {
    pool: PgPool,
}

impl PgCdrRepository {
    /// Create a new CDR repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CDR_SELECT_COLUMNS: &str = r#"
    id, uuid, direction,
    start_time, duration, billsec,
    from_number, to_number,
    bridge_uuid, inbound_cdr_id, phone_call_id,
    created_at
"#;

#[async_trait]
impl Repository<Cdr, i64> for PgCdrRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Cdr>> {
        debug!("Finding CDR by id: {}", id);

        let query = format!("SELECT {} FROM cdrs WHERE id = $1", CDR_SELECT_COLUMNS);

        let result = sqlx::query_as::<sqlx::Postgres, CdrRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding CDR {}: {}", id, e);
                AppError::Database(format!("Failed to find CDR: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Cdr>> {
        debug!("Finding all CDRs with limit {} offset {}", limit, offset);

        let query = format!(
            "SELECT {} FROM cdrs ORDER BY start_time DESC LIMIT $1 OFFSET $2",
            CDR_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CdrRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding CDRs: {}", e);
                AppError::Database(format!("Failed to fetch CDRs: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cdrs")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting CDRs: {}", e);
                AppError::Database(format!("Failed to count CDRs: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Cdr) -> AppResult<Cdr> {
        debug!("Creating CDR for call leg: {}", entity.uuid);

        let query = format!(
            r#"
            INSERT INTO cdrs (
                uuid, direction,
                start_time, duration, billsec,
                from_number, to_number,
                bridge_uuid, inbound_cdr_id, phone_call_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            CDR_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CdrRow>(&query)
            .bind(&entity.uuid)
            .bind(&entity.direction)
            .bind(entity.start_time)
            .bind(entity.duration)
            .bind(entity.billsec)
            .bind(&entity.from_number)
            .bind(&entity.to_number)
            .bind(&entity.bridge_uuid)
            .bind(entity.inbound_cdr_id)
            .bind(entity.phone_call_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating CDR: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::AlreadyExists(format!(
                        "CDR for call leg {} already exists",
                        entity.uuid
                    ))
                } else {
                    AppError::Database(format!("Failed to create CDR: {}", e))
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Cdr) -> AppResult<Cdr> {
        debug!("Updating CDR: {}", entity.id);

        let query = format!(
            r#"
            UPDATE cdrs
            SET uuid = $2,
                direction = $3,
                start_time = $4,
                duration = $5,
                billsec = $6,
                from_number = $7,
                to_number = $8,
                bridge_uuid = $9,
                inbound_cdr_id = $10,
                phone_call_id = $11
            WHERE id = $1
            RETURNING {}
            "#,
            CDR_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CdrRow>(&query)
            .bind(entity.id)
            .bind(&entity.uuid)
            .bind(&entity.direction)
            .bind(entity.start_time)
            .bind(entity.duration)
            .bind(entity.billsec)
            .bind(&entity.from_number)
            .bind(&entity.to_number)
            .bind(&entity.bridge_uuid)
            .bind(entity.inbound_cdr_id)
            .bind(entity.phone_call_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating CDR {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update CDR: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> AppResult<bool> {
        debug!("Deleting CDR: {}", id);

        let result = sqlx::query("DELETE FROM cdrs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting CDR {}: {}", id, e);
                AppError::Database(format!("Failed to delete CDR: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CdrRepository for PgCdrRepository {
    #[instrument(skip(self))]
    async fn find_by_uuid(&self, uuid: &str) -> AppResult<Option<Cdr>> {
        debug!("Finding CDR by UUID: {}", uuid);

        let query = format!("SELECT {} FROM cdrs WHERE uuid = $1", CDR_SELECT_COLUMNS);

        let result = sqlx::query_as::<sqlx::Postgres, CdrRow>(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding CDR by UUID: {}", e);
                AppError::Database(format!("Failed to find CDR: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_inbound_by_uuid(&self, uuid: &str) -> AppResult<Option<Cdr>> {
        debug!("Resolving inbound leg for bridge UUID: {}", uuid);

        let query = format!(
            "SELECT {} FROM cdrs WHERE uuid = $1 AND direction = 'inbound'",
            CDR_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, CdrRow>(&query)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error resolving inbound leg: {}", e);
                AppError::Database(format!("Failed to resolve inbound leg: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        direction: Option<&str>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Cdr>, i64)> {
        debug!(
            "Listing CDRs: direction={:?}, start={:?}, end={:?}, limit={}, offset={}",
            direction, start_date, end_date, limit, offset
        );

        let where_clause = r#"
            WHERE ($1::TEXT IS NULL OR direction = $1)
              AND ($2::TIMESTAMPTZ IS NULL OR start_time >= $2)
              AND ($3::TIMESTAMPTZ IS NULL OR start_time <= $3)
        "#;

        let count_query = format!("SELECT COUNT(*) FROM cdrs {}", where_clause);

        let total: (i64,) = sqlx::query_as(&count_query)
            .bind(direction)
            .bind(start_date)
            .bind(end_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting filtered CDRs: {}", e);
                AppError::Database(format!("Failed to count CDRs: {}", e))
            })?;

        let data_query = format!(
            "SELECT {} FROM cdrs {} ORDER BY start_time DESC LIMIT $4 OFFSET $5",
            CDR_SELECT_COLUMNS, where_clause
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CdrRow>(&data_query)
            .bind(direction)
            .bind(start_date)
            .bind(end_date)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching filtered CDRs: {}", e);
                AppError::Database(format!("Failed to fetch CDRs: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct CdrRow {
    id: i64,
    uuid: String,
    direction: String,
    start_time: DateTime<Utc>,
    duration: i32,
    billsec: i32,
    from_number: String,
    to_number: String,
    bridge_uuid: Option<String>,
    inbound_cdr_id: Option<i64>,
    phone_call_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl From<CdrRow> for Cdr {
    fn from(row: CdrRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            direction: row.direction,
            start_time: row.start_time,
            duration: row.duration,
            billsec: row.billsec,
            from_number: row.from_number,
            to_number: row.to_number,
            bridge_uuid: row.bridge_uuid,
            inbound_cdr_id: row.inbound_cdr_id,
            phone_call_id: row.phone_call_id,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdr_row_conversion() {
        let now = Utc::now();
        let row = CdrRow {
            id: 1,
            uuid: "CAaaaa".to_string(),
            direction: "outbound".to_string(),
            start_time: now,
            duration: 60,
            billsec: 60,
            from_number: "+819012345678".to_string(),
            to_number: "+818098765432".to_string(),
            bridge_uuid: Some("CAbbbb".to_string()),
            inbound_cdr_id: Some(2),
            phone_call_id: None,
            created_at: now,
        };

        let cdr: Cdr = row.into();
        assert_eq!(cdr.uuid, "CAaaaa");
        assert_eq!(cdr.duration, 60);
        assert_eq!(cdr.billsec, 60);
        assert_eq!(cdr.bridge_uuid.as_deref(), Some("CAbbbb"));
        assert!(cdr.is_bridged());
    }
}
