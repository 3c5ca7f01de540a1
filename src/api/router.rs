use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Reads are public; wallet mutations need the bearer token when API_TOKEN is set
    let auth = middleware::from_fn_with_state(state.clone(), require_auth);

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        // Wallet registry
        .route(
            "/api/wallets",
            get(handlers::wallets::list).merge(post(handlers::wallets::create).route_layer(auth.clone())),
        )
        .route(
            "/api/wallets/:address",
            delete(handlers::wallets::remove).route_layer(auth),
        )
        // Ingested account data
        .route("/api/wallets/:address/summary", get(handlers::accounts::summary))
        .route("/api/wallets/:address/positions", get(handlers::accounts::positions))
        .route("/api/wallets/:address/fills", get(handlers::accounts::fills));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
