//! CDR handlers
//!
//! Batch upload plus the filtered listing and single-record read views.

use crate::dto::{ApiResponse, CdrBatchResponse, CdrFilterParams, CdrResponse};
use actix_web::{
    web::{self, Data, Path, Query},
    HttpResponse,
};
use chibi_carrier::client::HttpCarrierClient;
use chibi_core::error::AppError;
use chibi_core::traits::{CdrRepository, PaginatedResponse, PaginationMeta, Repository};
use chibi_db::repositories::{PgCdrRepository, PgPhoneCallRepository};
use chibi_services::cdr::{CdrIngestService, CdrReconciler};
use chibi_services::storage::XmlStore;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Ingest an uploaded CDR XML batch
///
/// POST /api/v1/cdr-batches
#[instrument(skip_all, fields(bytes = payload.len()))]
pub async fn create_cdr_batch(
    pool: Data<PgPool>,
    carrier: Data<Arc<HttpCarrierClient>>,
    store: Data<XmlStore>,
    payload: String,
) -> Result<HttpResponse, AppError> {
    let service = CdrIngestService::new(
        CdrReconciler::new(
            carrier.get_ref().clone(),
            PgCdrRepository::new(pool.get_ref().clone()),
            PgPhoneCallRepository::new(pool.get_ref().clone()),
        ),
        store.get_ref().clone(),
    );

    let created = service.ingest_batch(&payload).await?;

    let response = CdrBatchResponse {
        ingested: created.len(),
        cdrs: created.into_iter().map(CdrResponse::from).collect(),
    };
    Ok(HttpResponse::Created().json(ApiResponse::success(response)))
}

/// List CDRs with filtering and pagination
///
/// GET /api/v1/cdrs?page=1&per_page=50&direction=outbound&start_date=...
#[instrument(skip(pool, query))]
pub async fn list_cdrs(
    pool: Data<PgPool>,
    query: Query<CdrFilterParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Invalid query parameters: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(
        "Listing CDRs: page={}, direction={:?}",
        query.pagination.page, query.direction
    );

    let repo = PgCdrRepository::new(pool.get_ref().clone());
    let (cdrs, total) = repo
        .list_filtered(
            query.direction.as_deref(),
            query.start_date,
            query.end_date,
            query.pagination.limit(),
            query.pagination.offset(),
        )
        .await?;

    let response = PaginatedResponse {
        data: cdrs.into_iter().map(CdrResponse::from).collect::<Vec<_>>(),
        pagination: PaginationMeta::new(total, query.pagination.page, query.pagination.per_page),
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Fetch one CDR by id
///
/// GET /api/v1/cdrs/{id}
#[instrument(skip(pool))]
pub async fn get_cdr(pool: Data<PgPool>, id: Path<i64>) -> Result<HttpResponse, AppError> {
    let repo = PgCdrRepository::new(pool.get_ref().clone());
    let cdr = repo
        .find_by_id(*id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CDR {}", id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(CdrResponse::from(cdr))))
}

/// Configure CDR routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/cdr-batches").route(web::post().to(create_cdr_batch)))
        .service(web::resource("/cdrs").route(web::get().to(list_cdrs)))
        .service(web::resource("/cdrs/{id}").route(web::get().to(get_cdr)));
}
