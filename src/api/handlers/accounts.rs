use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::db::{fill_repo, position_repo, summary_repo};
use crate::errors::AppError;
use crate::models::{AccountSummary, Fill, Position};
use crate::AppState;

use super::{parse_address, ApiResponse};

const DEFAULT_FILL_LIMIT: i64 = 50;
const MAX_FILL_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct FillsQuery {
    pub limit: Option<i64>,
}

/// GET /api/wallets/{address}/summary
pub async fn summary(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<AccountSummary>>, AppError> {
    let address = parse_address(&address)?;
    let summary = summary_repo::get_summary(&state.db, &address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no summary for {address}")))?;

    Ok(Json(ApiResponse::ok(summary)))
}

/// GET /api/wallets/{address}/positions — includes flat rows
pub async fn positions(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    let address = parse_address(&address)?;
    let positions = position_repo::get_positions(&state.db, &address).await?;

    Ok(Json(ApiResponse::ok(positions)))
}

/// GET /api/wallets/{address}/fills?limit=N — newest first
pub async fn fills(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<FillsQuery>,
) -> Result<Json<ApiResponse<Vec<Fill>>>, AppError> {
    let address = parse_address(&address)?;
    let limit = fill_limit(query.limit);
    let fills = fill_repo::get_recent_fills(&state.db, &address, limit).await?;

    Ok(Json(ApiResponse::ok(fills)))
}

fn fill_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_FILL_LIMIT)
        .clamp(1, MAX_FILL_LIMIT)
}
