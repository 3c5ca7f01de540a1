//! Collaborator seams of the ingestion pipeline.
//!
//! The pipeline only ever talks to the exchange REST API, the wallet registry
//! and the store through these traits, so the coordinator can be driven by
//! in-memory doubles in tests. Futures are required to be `Send` because the
//! periodic re-snapshot task runs on its own tokio task.

use std::future::Future;

use serde_json::Value;

use crate::errors::IngestError;
use crate::models::{AccountSnapshot, NewFill, SnapshotPosition, SnapshotSummary};

/// Request/response access to raw account state.
pub trait AccountStateSource: Send + Sync {
    /// Raw account-state document for one wallet. Transport failures and
    /// non-2xx responses surface as `UpstreamUnavailable`, never as an empty
    /// document.
    fn fetch_account_state(
        &self,
        wallet: &str,
    ) -> impl Future<Output = Result<Value, IngestError>> + Send;

    /// Raw fill history for one wallet.
    fn fetch_user_fills(
        &self,
        wallet: &str,
        start_time_ms: Option<i64>,
    ) -> impl Future<Output = Result<Value, IngestError>> + Send;
}

/// Read-only view of the tracked wallet set.
///
/// Membership changes at any time, so callers re-query on every pass
/// instead of caching the result.
pub trait WalletRegistry: Send + Sync {
    fn list_active_wallets(&self) -> impl Future<Output = Result<Vec<String>, IngestError>> + Send;
}

/// Idempotent write contracts of the store.
pub trait PersistenceSink: Send + Sync {
    /// Replace the summary row for `wallet` (last write wins).
    fn upsert_summary(
        &self,
        wallet: &str,
        summary: &SnapshotSummary,
    ) -> impl Future<Output = Result<(), IngestError>> + Send;

    /// Replace the row for (`wallet`, `position.coin`).
    fn upsert_position(
        &self,
        wallet: &str,
        position: &SnapshotPosition,
    ) -> impl Future<Output = Result<(), IngestError>> + Send;

    /// Write the summary and every position of `snapshot` as one unit:
    /// either all rows land or none do.
    fn apply_snapshot(
        &self,
        wallet: &str,
        snapshot: &AccountSnapshot,
    ) -> impl Future<Output = Result<(), IngestError>> + Send;

    /// Insert-or-ignore on (`wallet`, `fill.fill_id`). Returns `true` when a
    /// new row was written.
    fn insert_fill_if_absent(
        &self,
        wallet: &str,
        fill: &NewFill,
    ) -> impl Future<Output = Result<bool, IngestError>> + Send;
}
