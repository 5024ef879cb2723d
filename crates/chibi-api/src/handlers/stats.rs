//! Statistics handlers
//!
//! Aggregate read views over users, messages, and calls. These are raw
//! grouped queries; nothing here mutates state.

use crate::dto::stats::{DailyInteractions, DemographicsBucket};
use crate::dto::{ApiResponse, DemographicsResponse, InteractionsResponse, OverviewResponse};
use actix_web::{
    web::{self, Data},
    HttpResponse,
};
use chibi_core::error::AppError;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Service-wide counters
///
/// GET /api/v1/stats/overview
#[instrument(skip(pool))]
pub async fn get_overview(pool: Data<PgPool>) -> Result<HttpResponse, AppError> {
    debug!("Fetching overview statistics");

    let row = sqlx::query(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users)::BIGINT as total_users,
            (SELECT COUNT(*) FROM messages)::BIGINT as total_messages,
            (SELECT COUNT(*) FROM phone_calls)::BIGINT as total_phone_calls,
            (SELECT COUNT(*) FROM cdrs)::BIGINT as total_cdrs,
            (SELECT COUNT(*) FROM phone_calls WHERE status = 'missed')::BIGINT as missed_calls,
            (SELECT COALESCE(SUM(duration), 0) FROM cdrs)::BIGINT as total_call_seconds
        "#,
    )
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(format!("Failed to fetch overview: {}", e)))?;

    let response = OverviewResponse {
        total_users: row.get("total_users"),
        total_messages: row.get("total_messages"),
        total_phone_calls: row.get("total_phone_calls"),
        total_cdrs: row.get("total_cdrs"),
        missed_calls: row.get("missed_calls"),
        total_call_seconds: row.get("total_call_seconds"),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// User demographics by gender and region
///
/// GET /api/v1/stats/demographics
#[instrument(skip(pool))]
pub async fn get_demographics(pool: Data<PgPool>) -> Result<HttpResponse, AppError> {
    debug!("Fetching demographics statistics");

    let rows = sqlx::query(
        r#"
        SELECT gender, region, COUNT(*)::BIGINT as user_count
        FROM users
        GROUP BY gender, region
        ORDER BY user_count DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(format!("Failed to fetch demographics: {}", e)))?;

    let buckets = rows
        .into_iter()
        .map(|row| DemographicsBucket {
            gender: row.get("gender"),
            region: row.get("region"),
            user_count: row.get("user_count"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(DemographicsResponse { buckets })))
}

/// Daily message and call volumes (last 7 days)
///
/// GET /api/v1/stats/interactions
#[instrument(skip(pool))]
pub async fn get_interactions(pool: Data<PgPool>) -> Result<HttpResponse, AppError> {
    debug!("Fetching interaction statistics");

    let since = (Utc::now() - Duration::days(7)).date_naive();

    let message_rows = sqlx::query(
        r#"
        SELECT DATE(created_at) as date, COUNT(*)::BIGINT as volume
        FROM messages
        WHERE DATE(created_at) >= $1
        GROUP BY DATE(created_at)
        "#,
    )
    .bind(since)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(format!("Failed to fetch message volumes: {}", e)))?;

    let call_rows = sqlx::query(
        r#"
        SELECT DATE(created_at) as date, COUNT(*)::BIGINT as volume
        FROM phone_calls
        WHERE DATE(created_at) >= $1
        GROUP BY DATE(created_at)
        "#,
    )
    .bind(since)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(format!("Failed to fetch call volumes: {}", e)))?;

    let mut by_date: BTreeMap<chrono::NaiveDate, (i64, i64)> = BTreeMap::new();
    for row in message_rows {
        let date: chrono::NaiveDate = row.get("date");
        by_date.entry(date).or_default().0 = row.get("volume");
    }
    for row in call_rows {
        let date: chrono::NaiveDate = row.get("date");
        by_date.entry(date).or_default().1 = row.get("volume");
    }

    let days = by_date
        .into_iter()
        .map(|(date, (messages, calls))| DailyInteractions {
            date: date.format("%Y-%m-%d").to_string(),
            messages,
            calls,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(InteractionsResponse { days })))
}

/// Configure statistics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stats")
            .route("/overview", web::get().to(get_overview))
            .route("/demographics", web::get().to(get_demographics))
            .route("/interactions", web::get().to(get_interactions)),
    );
}
