//! Chibi Backend Server
//!
//! Webhook ingestion, CDR reconciliation, aggregate read views, and the
//! stale job-queue worker reaper, behind a single actix-web server.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer};
use chibi_api::handlers::{
    configure_admin, configure_calls, configure_cdrs, configure_chats, configure_health,
    configure_messages, configure_receipts, configure_stats, configure_users,
};
use chibi_carrier::client::HttpCarrierClient;
use chibi_core::config::AppConfig;
use chibi_core::traits::WorkerRegistry;
use chibi_db::create_pool;
use chibi_queue::RedisWorkerRegistry;
use chibi_services::{StaleWorkerReaper, XmlStore};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configure API routes
fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(configure_health)
            .configure(configure_messages)
            .configure(configure_calls)
            .configure(configure_receipts)
            .configure(configure_cdrs)
            .configure(configure_stats)
            .configure(configure_chats)
            .configure(configure_users),
    )
    .configure(configure_admin);
}

/// Initialize tracing/logging
fn init_tracing() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chibi_backend={},chibi_api={},chibi_services={},chibi_db={},actix_web=info,sqlx=warn",
            log_level, log_level, log_level, log_level
        ))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting Chibi Backend v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    info!("Connecting to database...");
    let pool = create_pool(&config.database.url, Some(config.database.max_connections))
        .await
        .map_err(|e| {
            error!("Failed to create database pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
        })?;
    info!(
        "Database connection established with {} max connections",
        config.database.max_connections
    );

    info!("Connecting to job-queue registry...");
    let registry: Arc<dyn WorkerRegistry> = Arc::new(
        RedisWorkerRegistry::new(&config.redis.url).await.map_err(|e| {
            error!("Failed to connect to Redis: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
        })?,
    );

    let carrier = Arc::new(HttpCarrierClient::new(&config.carrier).map_err(|e| {
        error!("Failed to build carrier client: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?);

    let store = XmlStore::new(&config.storage.root);

    // Background reaper, stopped through the watch channel on shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = StaleWorkerReaper::new(registry.clone(), config.reaper.stale_after_secs);
    let reaper_interval = Duration::from_secs(config.reaper.interval_secs);
    let reaper_handle = tokio::spawn(async move {
        reaper.run(reaper_interval, shutdown_rx).await;
    });

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    let app_config = config.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(carrier.clone()))
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(app_config.reaper.clone()))
            .app_data(web::Data::new(app_config.admin.clone()))
            // Carrier batch uploads can be large
            .app_data(web::PayloadConfig::new(10 * 1024 * 1024))
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_routes)
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/health"))
                        .finish()
                }),
            )
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run();

    let result = server.await;

    info!("HTTP server stopped, shutting down reaper");
    let _ = shutdown_tx.send(true);
    let _ = reaper_handle.await;

    result
}
