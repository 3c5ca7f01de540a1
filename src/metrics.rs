use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all ingestion metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("snapshots_applied_total").absolute(0);
    counter!("snapshot_failures_total").absolute(0);
    counter!("fills_inserted_total").absolute(0);
    counter!("fills_duplicate_total").absolute(0);
    counter!("ws_frames_total").absolute(0);
    counter!("ws_reconnects_total").absolute(0);
    counter!("user_events_total").absolute(0);

    gauge!("tracked_wallets").set(0.0);
    gauge!("ws_connected").set(0.0);

    histogram!("snapshot_apply_seconds").record(0.0);

    Ok(handle)
}
