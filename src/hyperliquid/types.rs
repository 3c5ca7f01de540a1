use serde::Serialize;

/// Streaming channel carrying a wallet's trade fills.
pub const FILLS_CHANNEL: &str = "userFills";

/// Streaming channel carrying account events (fills, funding, liquidations).
pub const EVENTS_CHANNEL: &str = "userEvents";

// ---------------------------------------------------------------------------
// Info endpoint (REST)
// ---------------------------------------------------------------------------

/// Body of a `POST /info` request.
#[derive(Debug, Clone, Serialize)]
pub struct InfoRequest {
    #[serde(rename = "type")]
    pub request_type: &'static str,
    pub user: String,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}

impl InfoRequest {
    /// Perp account summary + positions.
    pub fn clearinghouse_state(user: &str) -> Self {
        Self {
            request_type: "clearinghouseState",
            user: user.to_string(),
            start_time: None,
        }
    }

    pub fn user_fills(user: &str, start_time: Option<i64>) -> Self {
        Self {
            request_type: "userFills",
            user: user.to_string(),
            start_time,
        }
    }
}

// ---------------------------------------------------------------------------
// WebSocket subscribe message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WsSubscribe {
    pub method: &'static str,
    pub subscription: WsSubscription,
}

#[derive(Debug, Clone, Serialize)]
pub struct WsSubscription {
    #[serde(rename = "type")]
    pub channel: &'static str,
    pub user: String,
}

impl WsSubscribe {
    pub fn new(channel: &'static str, user: &str) -> Self {
        Self {
            method: "subscribe",
            subscription: WsSubscription {
                channel,
                user: user.to_string(),
            },
        }
    }
}
