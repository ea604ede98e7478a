// src/lib.rs

use sea_orm::DatabaseConnection;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

pub mod entities {
    pub mod prelude;
    pub mod deals;
    pub mod products;
    pub mod sync_logs;
}

pub mod services {
    pub mod catalog_client;
    pub mod deal_store;
    pub mod deals;
    pub mod product_store;
    pub mod rate_limiter;
    pub mod scheduler;
    pub mod sync_log_store;
}

pub mod handlers {
    pub mod sync_logs;
}

pub mod config;
pub mod jobs;
