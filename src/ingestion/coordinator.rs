//! Top-level ingestion loop.
//!
//! Each cycle: resolve wallets → full REST snapshot pass → open a stream
//! session → read frames while a sibling task re-snapshots on a timer. Any
//! failure tears the whole cycle down and restarts it after a backoff delay.
//! This is the only place in the pipeline that retries.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::applier::SnapshotApplier;
use super::backoff::Backoff;
use super::fills::{backfill_fills, normalize_fill, persist_fill};
use super::ports::{AccountStateSource, PersistenceSink, WalletRegistry};
use super::stream::{StreamFrame, StreamSession, StreamSettings, WalletFill};
use crate::errors::IngestError;
use crate::models::normalize_address;

const DEFAULT_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub ws_url: String,
    /// Period of the timer-driven re-snapshot while streaming.
    pub refresh_interval: Duration,
    /// Fixed wait when there is nothing to track.
    pub empty_wallet_retry: Duration,
    pub reconnect_floor: Duration,
    pub reconnect_ceiling: Duration,
    /// Pull REST fill history during the initial pass of every cycle.
    pub fill_backfill: bool,
    pub stream: StreamSettings,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.into(),
            refresh_interval: Duration::from_secs(30),
            empty_wallet_retry: Duration::from_secs(2),
            reconnect_floor: Duration::from_secs(1),
            reconnect_ceiling: Duration::from_secs(30),
            fill_backfill: true,
            stream: StreamSettings::default(),
        }
    }
}

enum CycleEnd {
    NoWallets,
    Shutdown,
}

pub struct IngestionCoordinator<S, R, P> {
    config: IngestionConfig,
    applier: Arc<SnapshotApplier<S, P>>,
    registry: Arc<R>,
    backoff: Backoff,
}

impl<S, R, P> IngestionCoordinator<S, R, P>
where
    S: AccountStateSource + 'static,
    R: WalletRegistry + 'static,
    P: PersistenceSink + 'static,
{
    pub fn new(config: IngestionConfig, source: Arc<S>, registry: Arc<R>, sink: Arc<P>) -> Self {
        let backoff = Backoff::new(config.reconnect_floor, config.reconnect_ceiling);
        Self {
            applier: Arc::new(SnapshotApplier::new(source, sink)),
            registry,
            backoff,
            config,
        }
    }

    /// Run until `shutdown` is cancelled. On return the periodic task has
    /// stopped and the socket is closed.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(
            ws_url = %self.config.ws_url,
            refresh_secs = self.config.refresh_interval.as_secs(),
            "Ingestion coordinator started"
        );

        loop {
            let delay = match self.run_cycle(&shutdown).await {
                Ok(CycleEnd::NoWallets) => self.config.empty_wallet_retry,
                Ok(CycleEnd::Shutdown) => break,
                Err(e) if e.is_cancelled() => break,
                Err(e) => {
                    counter!("ws_reconnects_total").increment(1);
                    let delay = self.backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        failures = self.backoff.failures(),
                        "Ingestion cycle failed — restarting"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }

        gauge!("ws_connected").set(0.0);
        tracing::info!("Ingestion coordinator stopped");
    }

    async fn run_cycle(&mut self, shutdown: &CancellationToken) -> Result<CycleEnd, IngestError> {
        let wallets = cancellable(shutdown, resolve_wallets(&*self.registry)).await?;
        gauge!("tracked_wallets").set(wallets.len() as f64);
        if wallets.is_empty() {
            tracing::debug!("No active wallets — waiting");
            return Ok(CycleEnd::NoWallets);
        }

        // Full sync before streaming so readers never see an empty store
        // after a reconnect.
        tracing::info!(wallets = wallets.len(), "Initial snapshot pass");
        cancellable(shutdown, self.initial_sync(&wallets)).await?;

        let mut session = StreamSession::new(self.config.ws_url.as_str(), &self.config.stream);
        if let Err(e) = cancellable(shutdown, session.connect(&wallets)).await {
            session.close().await;
            return Err(e);
        }

        // Connection establishment is what counts as healthy.
        self.backoff.reset();
        gauge!("ws_connected").set(1.0);

        let result = self.stream(&mut session, shutdown).await;

        session.close().await;
        gauge!("ws_connected").set(0.0);

        result.map(|()| CycleEnd::Shutdown)
    }

    async fn initial_sync(&self, wallets: &[String]) -> Result<(), IngestError> {
        self.applier.resync(wallets).await?;

        if self.config.fill_backfill {
            for wallet in wallets {
                backfill_fills(self.applier.source(), self.applier.sink(), wallet).await?;
            }
        }
        Ok(())
    }

    /// Read frames until the session fails, the periodic task fails, or
    /// shutdown is requested (`Ok`). The periodic task never outlives this
    /// call.
    async fn stream(
        &self,
        session: &mut StreamSession,
        shutdown: &CancellationToken,
    ) -> Result<(), IngestError> {
        let refresh_token = shutdown.child_token();
        let mut refresher = tokio::spawn(periodic_refresh(
            Arc::clone(&self.applier),
            Arc::clone(&self.registry),
            self.config.refresh_interval,
            refresh_token.clone(),
        ));
        let mut refresher_done = false;

        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                joined = &mut refresher => {
                    refresher_done = true;
                    break match joined {
                        Ok(outcome) => outcome,
                        Err(join_err) => Err(join_err.into()),
                    };
                }
                frame = session.next_frame() => {
                    let frame = match frame {
                        Ok(frame) => frame,
                        Err(e) => break Err(e),
                    };
                    match cancellable(shutdown, self.handle_frame(frame)).await {
                        Ok(()) => {}
                        Err(IngestError::Cancelled) => break Ok(()),
                        Err(e) => break Err(e),
                    }
                }
            }
        };

        refresh_token.cancel();
        if !refresher_done {
            if let Err(e) = refresher.await {
                tracing::error!(error = %e, "Periodic snapshot task panicked");
            }
        }

        result
    }

    async fn handle_frame(&self, frame: StreamFrame) -> Result<(), IngestError> {
        match frame {
            StreamFrame::Fills(fills) => {
                for WalletFill { wallet, payload } in &fills {
                    persist_fill(self.applier.sink(), wallet, &normalize_fill(payload)).await?;
                }
                Ok(())
            }
            StreamFrame::UserEvent => {
                // The event does not reliably say which wallet it concerns,
                // so every tracked wallet is refreshed.
                counter!("user_events_total").increment(1);
                let wallets = resolve_wallets(&*self.registry).await?;
                tracing::debug!(wallets = wallets.len(), "User event — resyncing all wallets");
                self.applier.resync(&wallets).await
            }
            StreamFrame::Snapshot | StreamFrame::Ignored => Ok(()),
        }
    }
}

/// Re-snapshot every tracked wallet each `every` until `token` is
/// cancelled. Membership is re-read on every pass so wallets added while
/// streaming get their first snapshot without a reconnect.
async fn periodic_refresh<S, R, P>(
    applier: Arc<SnapshotApplier<S, P>>,
    registry: Arc<R>,
    every: Duration,
    token: CancellationToken,
) -> Result<(), IngestError>
where
    S: AccountStateSource,
    R: WalletRegistry,
    P: PersistenceSink,
{
    loop {
        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            _ = sleep(every) => {}
        }

        let pass = async {
            let wallets = resolve_wallets(&*registry).await?;
            gauge!("tracked_wallets").set(wallets.len() as f64);
            applier.resync(&wallets).await?;
            Ok::<usize, IngestError>(wallets.len())
        };

        match cancellable(&token, pass).await {
            Ok(count) => tracing::debug!(wallets = count, "Periodic snapshot pass complete"),
            Err(IngestError::Cancelled) => return Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Periodic snapshot pass failed");
                return Err(e);
            }
        }
    }
}

/// Current wallet set, lowercased and deduplicated in registry order.
pub async fn resolve_wallets<R: WalletRegistry>(registry: &R) -> Result<Vec<String>, IngestError> {
    let mut seen = HashSet::new();
    Ok(registry
        .list_active_wallets()
        .await?
        .iter()
        .map(|w| normalize_address(w))
        .filter(|w| !w.is_empty() && seen.insert(w.clone()))
        .collect())
}

/// Race `fut` against `token`. Dropping an in-flight store write rolls its
/// transaction back, so nothing is left half-applied.
async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, IngestError>
where
    F: Future<Output = Result<T, IngestError>>,
{
    tokio::select! {
        _ = token.cancelled() => Err(IngestError::Cancelled),
        res = fut => res,
    }
}
