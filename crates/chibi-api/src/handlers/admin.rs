//! Admin queue dashboard handlers
//!
//! Worker snapshot with stale classification, and a manual reap trigger.
//! Everything here requires basic auth via the [`AdminUser`] extractor.

use crate::auth::AdminUser;
use crate::dto::{ApiResponse, ReapResponse, WorkerStatusResponse};
use actix_web::{
    web::{self, Data},
    HttpResponse,
};
use chibi_core::config::ReaperConfig;
use chibi_core::error::AppError;
use chibi_core::traits::WorkerRegistry;
use chibi_services::reaper::StaleWorkerReaper;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// Snapshot all registered workers with stale classification
///
/// GET /admin/queue/workers
#[instrument(skip(registry, config, _admin))]
pub async fn list_workers(
    registry: Data<Arc<dyn WorkerRegistry>>,
    config: Data<ReaperConfig>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let workers = registry.workers().await?;
    let now = Utc::now();
    let threshold = Duration::seconds(config.stale_after_secs);

    let statuses: Vec<WorkerStatusResponse> = workers
        .into_iter()
        .map(|worker| WorkerStatusResponse::from_snapshot(worker, now, threshold))
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(statuses)))
}

/// Run a reap pass immediately
///
/// POST /admin/queue/reap
#[instrument(skip(registry, config, admin))]
pub async fn reap_now(
    registry: Data<Arc<dyn WorkerRegistry>>,
    config: Data<ReaperConfig>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    info!("Manual reap pass requested by {}", admin.username);

    let reaper = StaleWorkerReaper::new(registry.get_ref().clone(), config.stale_after_secs);
    let released = reaper.clean_stale_workers().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::with_message(
        ReapResponse { released },
        format!("Released {} stale claims", released),
    )))
}

/// Configure admin queue routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/queue")
            .route("/workers", web::get().to(list_workers))
            .route("/reap", web::post().to(reap_now)),
    );
}
