use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Database row for positions, unique per (wallet, coin).
///
/// Rows are never deleted; a closed position stays behind with
/// `size = 0` and an empty side.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: Uuid,
    pub wallet: String,
    pub coin: String,
    pub side: String,
    pub size: Decimal,
    pub entry_px: Decimal,
    pub mark_px: Decimal,
    pub liq_px: Decimal,
    pub leverage: Decimal,
    pub unrealized_pnl: Decimal,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// PositionSide
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    /// Derive the side from a signed size.
    pub fn from_signed(size: Decimal) -> Self {
        if size > Decimal::ZERO {
            PositionSide::Long
        } else if size < Decimal::ZERO {
            PositionSide::Short
        } else {
            PositionSide::Flat
        }
    }

    /// Stored representation; flat positions store an empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
            PositionSide::Flat => "",
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One position as normalized from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPosition {
    pub coin: String,
    pub side: PositionSide,
    /// Absolute magnitude of the upstream signed size.
    pub size: Decimal,
    pub entry_px: Decimal,
    pub mark_px: Decimal,
    pub liq_px: Decimal,
    pub leverage: Decimal,
    pub unrealized_pnl: Decimal,
}
