pub mod accounts;
pub mod health;
pub mod metrics;
pub mod wallets;

use serde::Serialize;

use crate::errors::AppError;
use crate::models::normalize_address;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Normalize an address taken from a path or body; blank is rejected.
pub(crate) fn parse_address(raw: &str) -> Result<String, AppError> {
    let address = normalize_address(raw);
    if address.is_empty() {
        return Err(AppError::BadRequest("address must not be empty".into()));
    }
    Ok(address)
}
