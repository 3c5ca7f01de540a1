pub mod fill;
pub mod position;
pub mod summary;
pub mod wallet;

pub use fill::{Fill, NewFill};
pub use position::{Position, PositionSide, SnapshotPosition};
pub use summary::{AccountSummary, SnapshotSummary};
pub use wallet::Wallet;

// ---------------------------------------------------------------------------
// AccountSnapshot: one normalized REST snapshot, never persisted as such
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSnapshot {
    pub summary: SnapshotSummary,
    pub positions: Vec<SnapshotPosition>,
}

/// Canonical form of a wallet address: trimmed and lowercased.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}
