use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

use super::normalizer::normalize_snapshot;
use super::ports::{AccountStateSource, PersistenceSink};
use crate::errors::IngestError;

/// Fetches, normalizes and commits one wallet's REST snapshot.
pub struct SnapshotApplier<S, P> {
    source: Arc<S>,
    sink: Arc<P>,
}

impl<S, P> SnapshotApplier<S, P>
where
    S: AccountStateSource,
    P: PersistenceSink,
{
    pub fn new(source: Arc<S>, sink: Arc<P>) -> Self {
        Self { source, sink }
    }

    /// Overwrite the stored summary and positions for `wallet`.
    ///
    /// Upstream failures propagate untouched; the summary and every position
    /// are committed together or not at all.
    pub async fn apply(&self, wallet: &str) -> Result<(), IngestError> {
        let start = Instant::now();

        let raw = match self.source.fetch_account_state(wallet).await {
            Ok(raw) => raw,
            Err(e) => {
                counter!("snapshot_failures_total").increment(1);
                return Err(e);
            }
        };
        let snapshot = normalize_snapshot(&raw);

        if let Err(e) = self.sink.apply_snapshot(wallet, &snapshot).await {
            counter!("snapshot_failures_total").increment(1);
            return Err(e);
        }

        counter!("snapshots_applied_total").increment(1);
        histogram!("snapshot_apply_seconds").record(start.elapsed().as_secs_f64());

        tracing::debug!(
            wallet,
            account_value = %snapshot.summary.account_value,
            margin_used = %snapshot.summary.margin_used,
            positions = snapshot.positions.len(),
            "Snapshot applied"
        );

        Ok(())
    }

    /// Apply sequentially over `wallets`, stopping at the first failure.
    pub async fn resync(&self, wallets: &[String]) -> Result<(), IngestError> {
        for wallet in wallets {
            self.apply(wallet).await?;
        }
        Ok(())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }
}
