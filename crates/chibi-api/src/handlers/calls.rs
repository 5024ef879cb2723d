//! Phone call handlers
//!
//! Call event and missed-call webhooks. A call event creates the PhoneCall
//! row and immediately runs the CDR shell through the carrier populate path,
//! so the leg is reconciled as soon as the carrier notifies us.

use crate::dto::{ApiResponse, MissedCallRequest, PhoneCallEventRequest, PhoneCallResponse};
use crate::handlers::messages::find_or_create_user;
use actix_web::{
    web::{self, Data, Json},
    HttpResponse,
};
use chibi_carrier::client::HttpCarrierClient;
use chibi_core::error::AppError;
use chibi_core::models::{call, PhoneCall};
use chibi_core::traits::Repository;
use chibi_db::repositories::{PgCdrRepository, PgPhoneCallRepository, PgUserRepository};
use chibi_services::cdr::CdrReconciler;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Accept a call event from the carrier
///
/// POST /api/v1/phone-calls
#[instrument(skip(pool, carrier, request), fields(call_uuid = %request.call_uuid))]
pub async fn create_phone_call(
    pool: Data<PgPool>,
    carrier: Data<Arc<HttpCarrierClient>>,
    request: Json<PhoneCallEventRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(|e| {
        warn!("Invalid call event webhook: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let users = PgUserRepository::new(pool.get_ref().clone());
    let user = find_or_create_user(&users, &request.from).await?;

    let calls = PgPhoneCallRepository::new(pool.get_ref().clone());
    let created = calls
        .create(&PhoneCall {
            call_uuid: request.call_uuid.clone(),
            from_number: request.from.clone(),
            to_number: request.to.clone(),
            status: call::status::INITIATED.to_string(),
            user_id: Some(user.id),
            ..Default::default()
        })
        .await?;

    // Reconcile the leg right away; the phone call row above lets the
    // inbound leg resolve its owner.
    let reconciler = CdrReconciler::new(
        carrier.get_ref().clone(),
        PgCdrRepository::new(pool.get_ref().clone()),
        PgPhoneCallRepository::new(pool.get_ref().clone()),
    );
    let cdr = reconciler.create_populated(&request.call_uuid).await?;

    info!(
        "Recorded phone call {} with CDR {}",
        created.call_uuid, cdr.id
    );
    Ok(HttpResponse::Created().json(ApiResponse::success(PhoneCallResponse::from(created))))
}

/// Accept a missed-call event from the carrier
///
/// POST /api/v1/missed-calls
#[instrument(skip(pool, request), fields(call_uuid = %request.call_uuid))]
pub async fn create_missed_call(
    pool: Data<PgPool>,
    request: Json<MissedCallRequest>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(|e| {
        warn!("Invalid missed-call webhook: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let users = PgUserRepository::new(pool.get_ref().clone());
    let user = find_or_create_user(&users, &request.from).await?;

    let calls = PgPhoneCallRepository::new(pool.get_ref().clone());
    let created = calls
        .create(&PhoneCall {
            call_uuid: request.call_uuid.clone(),
            from_number: request.from.clone(),
            to_number: request.to.clone(),
            status: call::status::MISSED.to_string(),
            user_id: Some(user.id),
            ..Default::default()
        })
        .await?;

    info!("Recorded missed call {}", created.call_uuid);
    Ok(HttpResponse::Created().json(ApiResponse::success(PhoneCallResponse::from(created))))
}

/// Configure phone call routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/phone-calls").route(web::post().to(create_phone_call)))
        .service(web::resource("/missed-calls").route(web::post().to(create_missed_call)));
}
