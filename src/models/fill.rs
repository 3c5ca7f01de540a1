use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for fills, unique per (wallet, fill_id). Fills are
/// immutable: a duplicate insert is ignored, never applied as an update.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Fill {
    pub id: Uuid,
    pub wallet: String,
    pub fill_id: String,
    /// Execution time in milliseconds since the epoch.
    pub ts: i64,
    pub coin: String,
    pub side: String,
    pub px: Decimal,
    pub sz: Decimal,
    pub fee: Decimal,
    pub raw: String,
    pub created_at: DateTime<Utc>,
}

/// A fill normalized from an upstream payload, ready for insert-or-ignore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFill {
    pub fill_id: String,
    pub ts: i64,
    pub coin: String,
    pub side: String,
    pub px: Decimal,
    pub sz: Decimal,
    pub fee: Decimal,
    /// Verbatim JSON of the upstream element.
    pub raw: String,
}
