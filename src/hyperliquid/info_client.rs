use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use super::types::InfoRequest;
use crate::errors::IngestError;
use crate::ingestion::AccountStateSource;

#[derive(Debug, Error)]
pub enum InfoClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<InfoClientError> for IngestError {
    fn from(e: InfoClientError) -> Self {
        IngestError::UpstreamUnavailable(e.to_string())
    }
}

/// Client for the Hyperliquid `/info` endpoint.
///
/// Responses are returned as raw JSON: the account-state schema drifts
/// between API versions, so shaping it is left to the normalizer.
#[derive(Debug, Clone)]
pub struct InfoClient {
    http: Client,
    info_url: String,
}

impl InfoClient {
    pub fn new(info_url: impl Into<String>, timeout: Duration) -> Result<Self, InfoClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            info_url: info_url.into(),
        })
    }

    async fn post(&self, body: &InfoRequest) -> Result<Value, InfoClientError> {
        let resp = self
            .http
            .post(&self.info_url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }

    /// Fetch perp account summary + positions for a wallet.
    pub async fn clearinghouse_state(&self, wallet: &str) -> Result<Value, InfoClientError> {
        self.post(&InfoRequest::clearinghouse_state(wallet)).await
    }

    /// Fetch recent fills for a wallet, optionally starting at `start_time_ms`.
    pub async fn user_fills(
        &self,
        wallet: &str,
        start_time_ms: Option<i64>,
    ) -> Result<Value, InfoClientError> {
        self.post(&InfoRequest::user_fills(wallet, start_time_ms)).await
    }
}

impl AccountStateSource for InfoClient {
    async fn fetch_account_state(&self, wallet: &str) -> Result<Value, IngestError> {
        Ok(self.clearinghouse_state(wallet).await?)
    }

    async fn fetch_user_fills(
        &self,
        wallet: &str,
        start_time_ms: Option<i64>,
    ) -> Result<Value, IngestError> {
        Ok(self.user_fills(wallet, start_time_ms).await?)
    }
}
