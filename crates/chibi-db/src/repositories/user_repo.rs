//! User repository implementation
//!
//! PostgreSQL-backed storage for users, keyed by phone number for webhook
//! sender resolution.

use async_trait::async_trait;
use chibi_core::{
    models::User,
    traits::{Repository, UserRepository},
    AppError, AppResult,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of UserRepository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_SELECT_COLUMNS: &str = r#"
    id, phone_number, nickname, gender, birth_year, region, created_at
"#;

#[async_trait]
impl Repository<User, i64> for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_SELECT_COLUMNS);

        let result = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user {}: {}", id, e);
                AppError::Database(format!("Failed to find user: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding users: {}", e);
                AppError::Database(format!("Failed to fetch users: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting users: {}", e);
                AppError::Database(format!("Failed to count users: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &User) -> AppResult<User> {
        debug!("Creating user for phone: {}", entity.phone_number);

        let query = format!(
            r#"
            INSERT INTO users (phone_number, nickname, gender, birth_year, region)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(&entity.phone_number)
            .bind(&entity.nickname)
            .bind(&entity.gender)
            .bind(entity.birth_year)
            .bind(&entity.region)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating user: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::AlreadyExists(format!(
                        "User with phone {} already exists",
                        entity.phone_number
                    ))
                } else {
                    AppError::Database(format!("Failed to create user: {}", e))
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &User) -> AppResult<User> {
        let query = format!(
            r#"
            UPDATE users
            SET phone_number = $2,
                nickname = $3,
                gender = $4,
                birth_year = $5,
                region = $6
            WHERE id = $1
            RETURNING {}
            "#,
            USER_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(entity.id)
            .bind(&entity.phone_number)
            .bind(&entity.nickname)
            .bind(&entity.gender)
            .bind(entity.birth_year)
            .bind(&entity.region)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating user {}: {}", entity.id, e);
                AppError::Database(format!("Failed to update user: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting user {}: {}", id, e);
                AppError::Database(format!("Failed to delete user: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_phone(&self, phone: &str) -> AppResult<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE phone_number = $1",
            USER_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, UserRow>(&query)
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding user by phone: {}", e);
                AppError::Database(format!("Failed to find user: {}", e))
            })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows to domain model
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    phone_number: String,
    nickname: String,
    gender: Option<String>,
    birth_year: Option<i32>,
    region: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            phone_number: row.phone_number,
            nickname: row.nickname,
            gender: row.gender,
            birth_year: row.birth_year,
            region: row.region,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_row_conversion() {
        let row = UserRow {
            id: 9,
            phone_number: "+819011112222".to_string(),
            nickname: "hana".to_string(),
            gender: Some("female".to_string()),
            birth_year: Some(1994),
            region: Some("tokyo".to_string()),
            created_at: Utc::now(),
        };

        let user: User = row.into();
        assert_eq!(user.id, 9);
        assert_eq!(user.nickname, "hana");
        assert_eq!(user.gender.as_deref(), Some("female"));
    }
}
