use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for account_summaries (one per wallet).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountSummary {
    pub id: Uuid,
    pub wallet: String,
    pub account_value: Decimal,
    pub margin_used: Decimal,
    pub unrealized_pnl: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Margin summary values extracted from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub account_value: Decimal,
    pub margin_used: Decimal,
    pub unrealized_pnl: Decimal,
}
