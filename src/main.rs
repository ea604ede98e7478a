use axum::{Json, Router, routing::get};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealradar_backend::AppState;
use dealradar_backend::config::Config;
use dealradar_backend::handlers;
use dealradar_backend::jobs::catalog_sync::{CatalogSyncEngine, start_catalog_sync_job};
use dealradar_backend::jobs::deal_cleanup::{DealExpiryReaper, start_deal_cleanup_job};
use dealradar_backend::services::catalog_client::HttpCatalogClient;
use dealradar_backend::services::deal_store::SeaOrmDealStore;
use dealradar_backend::services::product_store::SeaOrmProductStore;
use dealradar_backend::services::rate_limiter::FixedDelayLimiter;
use dealradar_backend::services::scheduler::Scheduler;
use dealradar_backend::services::sync_log_store::SeaOrmSyncLogStore;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dealradar_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env().expect("Invalid configuration");

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Wire the sync engine with its production stores and client
    let products = Arc::new(SeaOrmProductStore::new(db.clone()));
    let deals = Arc::new(SeaOrmDealStore::new(db.clone()));
    let sync_logs = Arc::new(SeaOrmSyncLogStore::new(db.clone()));
    let catalog = Arc::new(HttpCatalogClient::new(&config.catalog));
    let limiter = Arc::new(FixedDelayLimiter::from_millis(config.sync.rate_limit_ms));

    let engine = Arc::new(CatalogSyncEngine::new(
        products.clone(),
        deals.clone(),
        sync_logs,
        catalog,
        limiter,
        &config.sync,
    ));
    let reaper = Arc::new(DealExpiryReaper::new(products, deals));

    let mut scheduler = Scheduler::new();
    start_catalog_sync_job(
        &mut scheduler,
        engine,
        Duration::from_secs(config.sync.sync_interval_secs),
    );
    start_deal_cleanup_job(
        &mut scheduler,
        reaper,
        Duration::from_secs(config.sync.cleanup_interval_secs),
    );

    let state = AppState { db };

    // Build router: health probe plus the read-only audit surface
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/sync-logs", get(handlers::sync_logs::list_sync_logs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        "Server listening on {}",
        listener.local_addr().expect("listener has no local addr")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    scheduler.shutdown();
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
