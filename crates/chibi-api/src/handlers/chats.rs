//! Chat listing and user handlers
//!
//! A chat is a pair of numbers with message traffic between them; the pair
//! is normalized so each conversation appears once regardless of who spoke
//! last.

use crate::dto::{ApiResponse, ChatPairResponse, PaginationParams, UserResponse};
use actix_web::{
    web::{self, Data, Query},
    HttpResponse,
};
use chibi_core::error::AppError;
use chibi_core::traits::{PaginatedResponse, PaginationMeta, Repository};
use chibi_db::repositories::PgUserRepository;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use validator::Validate;

/// List chat pairs by most recent activity
///
/// GET /api/v1/chats
#[instrument(skip(pool))]
pub async fn list_chats(
    pool: Data<PgPool>,
    query: Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    debug!("Listing chats: page={}", query.page);

    let rows = sqlx::query(
        r#"
        SELECT
            LEAST(from_number, to_number) as number_a,
            GREATEST(from_number, to_number) as number_b,
            COUNT(*)::BIGINT as message_count,
            MAX(created_at) as last_message_at
        FROM messages
        GROUP BY LEAST(from_number, to_number), GREATEST(from_number, to_number)
        ORDER BY last_message_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(query.limit())
    .bind(query.offset())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(format!("Failed to fetch chats: {}", e)))?;

    let chats: Vec<ChatPairResponse> = rows
        .into_iter()
        .map(|row| ChatPairResponse {
            number_a: row.get("number_a"),
            number_b: row.get("number_b"),
            message_count: row.get("message_count"),
            last_message_at: row.get("last_message_at"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(chats)))
}

/// List users
///
/// GET /api/v1/users
#[instrument(skip(pool))]
pub async fn list_users(
    pool: Data<PgPool>,
    query: Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    let repo = PgUserRepository::new(pool.get_ref().clone());
    let users = repo.find_all(query.limit(), query.offset()).await?;
    let total = repo.count().await?;

    let response = PaginatedResponse {
        data: users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
        pagination: PaginationMeta::new(total, query.page, query.per_page),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Configure chat routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/chats").route(web::get().to(list_chats)));
}

/// Configure user routes
pub fn configure_users(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users").route(web::get().to(list_users)));
}
