//! Health check handler

use actix_web::{
    web::{self, Data},
    HttpResponse,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::error;

/// Liveness and database reachability check
///
/// GET /api/v1/health
pub async fn health(pool: Data<PgPool>) -> HttpResponse {
    let database = match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => "up",
        Err(e) => {
            error!("Health check database probe failed: {}", e);
            "down"
        }
    };

    let status = if database == "up" { "ok" } else { "degraded" };
    HttpResponse::Ok().json(json!({
        "status": status,
        "database": database,
    }))
}

/// Configure health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)));
}
