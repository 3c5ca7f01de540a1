use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::ingestion::{IngestionConfig, StreamSettings};

const DEFAULT_INFO_URL: &str = "https://api.hyperliquid.xyz/info";
const DEFAULT_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub app_title: String,

    /// Bearer token for wallet mutations. Empty / unset disables auth.
    pub api_token: Option<String>,

    // Hyperliquid endpoints
    pub hl_info_url: String,
    pub hl_ws_url: String,

    // Ingestion
    pub ingestion_enabled: bool,
    pub refresh_snapshot_secs: u64,
    pub empty_wallet_retry_secs: u64,
    pub reconnect_base_delay_secs: u64,
    pub reconnect_max_delay_secs: u64,
    pub http_timeout_secs: u64,
    pub ws_ping_interval_secs: u64,
    pub ws_ping_timeout_secs: u64,
    pub fill_backfill_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_title: env::var("APP_TITLE").unwrap_or_else(|_| "HyperDash Lite".into()),

            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),

            hl_info_url: env::var("HL_INFO_URL").unwrap_or_else(|_| DEFAULT_INFO_URL.into()),
            hl_ws_url: env::var("HL_WS_URL").unwrap_or_else(|_| DEFAULT_WS_URL.into()),

            ingestion_enabled: env_or("INGESTION_ENABLED", true),
            refresh_snapshot_secs: env_or("REFRESH_SNAPSHOT_SECONDS", 30),
            empty_wallet_retry_secs: env_or("EMPTY_WALLET_RETRY_SECS", 2),
            reconnect_base_delay_secs: env_or("RECONNECT_BASE_DELAY_SECS", 1),
            reconnect_max_delay_secs: env_or("RECONNECT_MAX_DELAY_SECS", 30),
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", 20),
            ws_ping_interval_secs: env_or("WS_PING_INTERVAL_SECS", 20),
            ws_ping_timeout_secs: env_or("WS_PING_TIMEOUT_SECS", 20),
            fill_backfill_enabled: env_or("FILL_BACKFILL_ENABLED", true),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Settings for the ingestion coordinator derived from this config.
    pub fn ingestion(&self) -> IngestionConfig {
        IngestionConfig {
            ws_url: self.hl_ws_url.clone(),
            refresh_interval: Duration::from_secs(self.refresh_snapshot_secs.max(1)),
            empty_wallet_retry: Duration::from_secs(self.empty_wallet_retry_secs.max(1)),
            reconnect_floor: Duration::from_secs(self.reconnect_base_delay_secs.max(1)),
            reconnect_ceiling: Duration::from_secs(self.reconnect_max_delay_secs),
            fill_backfill: self.fill_backfill_enabled,
            stream: StreamSettings {
                ping_interval: Duration::from_secs(self.ws_ping_interval_secs.max(1)),
                ping_timeout: Duration::from_secs(self.ws_ping_timeout_secs),
                connect_timeout: self.http_timeout(),
            },
        }
    }
}

/// Read an env var, falling back to `default` when unset or unparseable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    parse_or(env::var(key).ok().as_deref(), default)
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
