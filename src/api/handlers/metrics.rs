use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;

use crate::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4";

/// GET /metrics — Prometheus scrape
pub async fn render(State(state): State<AppState>) -> impl IntoResponse {
    // Drain histogram buckets so idle periods don't accumulate samples
    state.metrics_handle.run_upkeep();
    ([(CONTENT_TYPE, PROMETHEUS_TEXT)], state.metrics_handle.render())
}
