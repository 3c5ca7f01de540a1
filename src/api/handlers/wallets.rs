use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::db::wallet_repo;
use crate::errors::AppError;
use crate::models::Wallet;
use crate::AppState;

use super::{parse_address, ApiResponse};

#[derive(Deserialize)]
pub struct TrackWalletRequest {
    pub address: String,
    pub label: Option<String>,
}

/// GET /api/wallets — active wallets, newest first
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Wallet>>>, AppError> {
    let wallets = wallet_repo::get_active_wallets(&state.db).await?;
    Ok(Json(ApiResponse::ok(wallets)))
}

/// POST /api/wallets — start (or resume) tracking a wallet.
/// The ingestion loop picks it up on its next pass.
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<TrackWalletRequest>,
) -> Result<Json<ApiResponse<Wallet>>, AppError> {
    let address = parse_address(&body.address)?;
    let label = body.label.as_deref().map(str::trim).unwrap_or_default();

    let wallet = wallet_repo::upsert_wallet(&state.db, &address, label).await?;
    tracing::info!(address = %wallet.address, "Wallet tracked");

    Ok(Json(ApiResponse::ok(wallet)))
}

/// DELETE /api/wallets/{address} — stop tracking. Stored data is kept.
pub async fn remove(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let address = parse_address(&address)?;

    if !wallet_repo::deactivate_wallet(&state.db, &address).await? {
        return Err(AppError::NotFound(format!("wallet {address} not found")));
    }
    tracing::info!(%address, "Wallet deactivated");

    Ok(Json(ApiResponse::ok(())))
}
