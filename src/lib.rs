pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod hyperliquid;
pub mod ingestion;
pub mod metrics;
pub mod models;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
