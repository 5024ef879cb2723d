//! Message handlers
//!
//! Inbound SMS webhook and the paginated message listing. Two deliveries of
//! the same webhook can race on user creation; the loser retries through
//! `retry_on_conflict` and finds the row the winner inserted.

use crate::dto::{ApiResponse, InboundMessageRequest, MessageResponse, PaginationParams};
use actix_web::{
    web::{self, Data, Json, Query},
    HttpResponse,
};
use chibi_core::error::AppError;
use chibi_core::models::{message, Message, User};
use chibi_core::traits::{PaginatedResponse, PaginationMeta, Repository, UserRepository};
use chibi_db::repositories::{PgMessageRepository, PgUserRepository};
use chibi_services::retry::{retry_on_conflict, RetryPolicy};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Find the user owning `phone`, creating a bare profile if none exists
pub(crate) async fn find_or_create_user(
    repo: &PgUserRepository,
    phone: &str,
) -> Result<User, AppError> {
    let policy = RetryPolicy::default();
    let user = retry_on_conflict(&policy, || async move {
        if let Some(existing) = repo.find_by_phone(phone).await? {
            return Ok(existing);
        }

        let profile = User {
            phone_number: phone.to_string(),
            nickname: phone.to_string(),
            ..Default::default()
        };
        repo.create(&profile).await
    })
    .await?;

    Ok(user)
}

/// Accept an inbound SMS from the carrier
///
/// POST /api/v1/messages
#[instrument(skip(pool, request))]
pub async fn create_message(
    pool: Data<PgPool>,
    request: Json<InboundMessageRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(|e| {
        warn!("Invalid message webhook: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let users = PgUserRepository::new(pool.get_ref().clone());
    let user = find_or_create_user(&users, &request.from).await?;

    let messages = PgMessageRepository::new(pool.get_ref().clone());
    let created = messages
        .create(&Message {
            sid: request.sid.clone(),
            from_number: request.from.clone(),
            to_number: request.to.clone(),
            body: request.body.clone(),
            status: message::status::RECEIVED.to_string(),
            user_id: Some(user.id),
            ..Default::default()
        })
        .await?;

    info!("Stored inbound message {} from {}", created.sid, created.from_number);
    Ok(HttpResponse::Created().json(ApiResponse::success(MessageResponse::from(created))))
}

/// List messages, newest first
///
/// GET /api/v1/messages
#[instrument(skip(pool))]
pub async fn list_messages(
    pool: Data<PgPool>,
    query: Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| AppError::Validation(e.to_string()))?;

    debug!(
        "Listing messages: page={}, per_page={}",
        query.page, query.per_page
    );

    let repo = PgMessageRepository::new(pool.get_ref().clone());
    let rows = repo.find_all(query.limit(), query.offset()).await?;
    let total = repo.count().await?;

    let response = PaginatedResponse {
        data: rows.into_iter().map(MessageResponse::from).collect::<Vec<_>>(),
        pagination: PaginationMeta::new(total, query.page, query.per_page),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Configure message routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/messages")
            .route(web::post().to(create_message))
            .route(web::get().to(list_messages)),
    );
}
