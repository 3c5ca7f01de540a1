use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

// ---------------------------------------------------------------------------
// HTTP layer
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

// ---------------------------------------------------------------------------
// Ingestion pipeline
// ---------------------------------------------------------------------------

/// Failure taxonomy for the ingestion pipeline.
///
/// Inner components never retry; every variant except `Cancelled` makes the
/// coordinator tear the session down and restart after a backoff delay.
/// Malformed upstream payloads are not represented here: they degrade to
/// default values instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// REST or websocket transport/protocol failure, including non-2xx
    /// responses, undecodable frames, heartbeat timeouts and remote closes.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("persistence failure: {0:#}")]
    PersistenceFailure(anyhow::Error),

    #[error("background task failed: {0}")]
    TaskFailed(String),

    /// Cooperative shutdown. Never grows the backoff.
    #[error("ingestion cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }
}

impl From<sqlx::Error> for IngestError {
    fn from(e: sqlx::Error) -> Self {
        IngestError::PersistenceFailure(e.into())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for IngestError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        IngestError::UpstreamUnavailable(format!("websocket: {e}"))
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(e: tokio::task::JoinError) -> Self {
        IngestError::TaskFailed(e.to_string())
    }
}
