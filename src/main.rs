use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use hyperdash::api::router::create_router;
use hyperdash::config::AppConfig;
use hyperdash::db::{self, PgStore};
use hyperdash::hyperliquid::InfoClient;
use hyperdash::ingestion::IngestionCoordinator;
use hyperdash::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // tokio-tungstenite and reqwest both pull in rustls; pick the provider explicitly
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    db::run_migrations(&db).await?;
    tracing::info!("Database connected, migrations applied");

    let metrics_handle = hyperdash::metrics::init_metrics()?;

    // --- Ingestion: REST snapshots + websocket fills → Postgres ---
    let shutdown = CancellationToken::new();

    let ingestion = if config.ingestion_enabled {
        let source = Arc::new(InfoClient::new(&config.hl_info_url, config.http_timeout())?);
        let store = Arc::new(PgStore::new(db.clone()));
        let coordinator =
            IngestionCoordinator::new(config.ingestion(), source, Arc::clone(&store), store);

        let token = shutdown.clone();
        tracing::info!(ws_url = %config.hl_ws_url, "Spawning ingestion coordinator");
        Some(tokio::spawn(async move { coordinator.run(token).await }))
    } else {
        tracing::info!("Ingestion disabled (INGESTION_ENABLED=false)");
        None
    };

    let state = AppState {
        db,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped, shutting down ingestion");
    shutdown.cancel();
    if let Some(handle) = ingestion {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Ingestion task panicked");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // LOG_FORMAT=json for log shippers, human-readable otherwise
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
