//! One websocket session against the Hyperliquid streaming API.
//!
//! `Disconnected → Connecting → Subscribing → Streaming → (Closing | Failed)`.
//! A session never reconnects by itself: any failure is returned to the
//! coordinator, which owns retry policy.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use metrics::counter;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::{interval_at, timeout, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::fills::fill_wallet;
use crate::errors::IngestError;
use crate::hyperliquid::{WsSubscribe, EVENTS_CHANNEL, FILLS_CHANNEL};
use crate::models::normalize_address;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// How often the session pings the server.
    pub ping_interval: Duration,
    /// How long an unanswered ping may stay outstanding.
    pub ping_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(20),
            ping_timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Subscribing,
    Streaming,
    Closing,
    Failed,
}

/// A streamed fill paired with the wallet it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletFill {
    pub wallet: String,
    pub payload: Value,
}

/// Classification of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Fills in payload order.
    Fills(Vec<WalletFill>),
    /// Something happened on some tracked account; which one is not known.
    UserEvent,
    /// Initial snapshot replay, already covered by the REST pass.
    Snapshot,
    Ignored,
}

/// Decode and classify one text frame. Only a JSON decode error fails.
pub fn classify_frame(text: &str) -> Result<StreamFrame, IngestError> {
    let msg: Value = serde_json::from_str(text)
        .map_err(|e| IngestError::UpstreamUnavailable(format!("undecodable frame: {e}")))?;
    Ok(classify_message(&msg))
}

pub fn classify_message(msg: &Value) -> StreamFrame {
    let Some(obj) = msg.as_object() else {
        return StreamFrame::Ignored;
    };
    let data = obj.get("data");

    // The marker sits at the top level on some channels and inside `data` on
    // userFills.
    let is_snapshot = |v: Option<&Value>| v.and_then(Value::as_bool) == Some(true);
    if is_snapshot(obj.get("isSnapshot")) || is_snapshot(data.and_then(|d| d.get("isSnapshot"))) {
        return StreamFrame::Snapshot;
    }

    match obj.get("channel").and_then(Value::as_str) {
        Some(FILLS_CHANNEL) => match data {
            Some(Value::Array(items)) => StreamFrame::Fills(wallet_fills(items, None)),
            Some(Value::Object(inner)) => match inner.get("fills") {
                Some(Value::Array(items)) => {
                    let owner = inner
                        .get("user")
                        .and_then(Value::as_str)
                        .map(normalize_address)
                        .filter(|w| !w.is_empty());
                    StreamFrame::Fills(wallet_fills(items, owner.as_deref()))
                }
                _ => StreamFrame::Ignored,
            },
            _ => StreamFrame::Ignored,
        },
        Some(EVENTS_CHANNEL) => StreamFrame::UserEvent,
        _ => StreamFrame::Ignored,
    }
}

/// Elements without a resolvable wallet are dropped.
fn wallet_fills(items: &[Value], owner: Option<&str>) -> Vec<WalletFill> {
    items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| {
            let wallet = fill_wallet(item).or_else(|| owner.map(str::to_string))?;
            Some(WalletFill {
                wallet,
                payload: item.clone(),
            })
        })
        .collect()
}

/// One subscribe request per (wallet × {userFills, userEvents}).
pub fn build_subscribe_messages(wallets: &[String]) -> Vec<String> {
    wallets
        .iter()
        .flat_map(|wallet| {
            [FILLS_CHANNEL, EVENTS_CHANNEL]
                .into_iter()
                .map(move |channel| WsSubscribe::new(channel, wallet))
        })
        .filter_map(|sub| serde_json::to_string(&sub).ok())
        .collect()
}

enum Inbound {
    Message(Option<Result<Message, tungstenite::Error>>),
    PingDue,
    Detached,
}

struct Connection {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

pub struct StreamSession {
    url: String,
    settings: StreamSettings,
    state: SessionState,
    conn: Option<Connection>,
    ping_timer: Interval,
    ping_sent_at: Option<Instant>,
}

impl StreamSession {
    pub fn new(url: impl Into<String>, settings: &StreamSettings) -> Self {
        let mut ping_timer = interval_at(
            Instant::now() + settings.ping_interval,
            settings.ping_interval,
        );
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            url: url.into(),
            settings: settings.clone(),
            state: SessionState::Disconnected,
            conn: None,
            ping_timer,
            ping_sent_at: None,
        }
    }

    /// Connect and subscribe every wallet; on success the session is
    /// `Streaming`. Subscriptions are fire-and-forget: no acknowledgment is
    /// awaited.
    pub async fn connect(&mut self, wallets: &[String]) -> Result<(), IngestError> {
        self.state = SessionState::Connecting;
        tracing::info!(url = %self.url, wallets = wallets.len(), "Connecting to Hyperliquid WebSocket...");

        let connected = match timeout(self.settings.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((ws_stream, _response))) => ws_stream,
            Ok(Err(e)) => return Err(self.fail(format!("websocket connect failed: {e}"))),
            Err(_) => {
                let reason = format!(
                    "websocket connect timed out after {:?}",
                    self.settings.connect_timeout
                );
                return Err(self.fail(reason));
            }
        };

        tracing::info!("WebSocket connected successfully");

        let (write, read) = connected.split();
        self.conn = Some(Connection { write, read });
        self.state = SessionState::Subscribing;

        for msg in build_subscribe_messages(wallets) {
            if let Err(e) = self.send(Message::Text(msg.into())).await {
                return Err(self.fail(format!("failed to send subscribe message: {e}")));
            }
        }

        self.ping_timer.reset();
        self.ping_sent_at = None;
        self.state = SessionState::Streaming;

        tracing::info!(wallets = wallets.len(), "Subscribed to userFills + userEvents");
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Wait for the next actionable frame. Snapshot replays, acks and unknown
    /// channels are consumed silently. Any transport or decode problem moves
    /// the session to `Failed`.
    pub async fn next_frame(&mut self) -> Result<StreamFrame, IngestError> {
        loop {
            let inbound = match self.conn.as_mut() {
                Some(conn) => tokio::select! {
                    msg = conn.read.next() => Inbound::Message(msg),
                    _ = self.ping_timer.tick() => Inbound::PingDue,
                },
                None => Inbound::Detached,
            };

            match inbound {
                Inbound::Message(msg) => {
                    // Any inbound traffic proves the connection is alive.
                    self.ping_sent_at = None;
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            counter!("ws_frames_total").increment(1);
                            match classify_frame(text.as_str()) {
                                Ok(frame @ (StreamFrame::Fills(_) | StreamFrame::UserEvent)) => {
                                    return Ok(frame)
                                }
                                Ok(StreamFrame::Snapshot) => {
                                    tracing::debug!("Initial snapshot frame skipped");
                                }
                                Ok(StreamFrame::Ignored) => {
                                    tracing::trace!(raw = %text.as_str(), "Non-actionable frame");
                                }
                                Err(e) => {
                                    self.state = SessionState::Failed;
                                    tracing::warn!(error = %e, "Dropping session on undecodable frame");
                                    return Err(e);
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = self.send(Message::Pong(data)).await {
                                return Err(self.fail(format!("failed to send pong: {e}")));
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            return Err(self.fail(format!("server sent close frame: {frame:?}")));
                        }
                        Some(Ok(_)) => {} // binary, pong, raw frames
                        Some(Err(e)) => return Err(self.fail(format!("read error: {e}"))),
                        None => return Err(self.fail("stream ended".into())),
                    }
                }
                Inbound::PingDue => {
                    if let Some(sent_at) = self.ping_sent_at {
                        if sent_at.elapsed() >= self.settings.ping_timeout {
                            return Err(self.fail(format!(
                                "no traffic within {:?} of ping",
                                self.settings.ping_timeout
                            )));
                        }
                        continue;
                    }
                    if let Err(e) = self.send(Message::Ping(Vec::new().into())).await {
                        return Err(self.fail(format!("failed to send ping: {e}")));
                    }
                    self.ping_sent_at = Some(Instant::now());
                }
                Inbound::Detached => return Err(self.fail("websocket not connected".into())),
            }
        }
    }

    /// Close the socket if one is open. Never fails.
    pub async fn close(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            self.state = SessionState::Disconnected;
            return;
        };
        self.state = SessionState::Closing;
        let _ = timeout(CLOSE_TIMEOUT, async {
            let _ = conn.write.send(Message::Close(None)).await;
            let _ = conn.write.close().await;
        })
        .await;
        self.state = SessionState::Disconnected;
        tracing::info!("WebSocket session closed");
    }

    async fn send(&mut self, msg: Message) -> Result<(), tungstenite::Error> {
        match self.conn.as_mut() {
            Some(conn) => conn.write.send(msg).await,
            None => Err(tungstenite::Error::AlreadyClosed),
        }
    }

    fn fail(&mut self, reason: String) -> IngestError {
        self.state = SessionState::Failed;
        tracing::warn!(reason = %reason, "WebSocket session failed");
        IngestError::UpstreamUnavailable(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_messages_cover_both_channels() {
        let wallets = vec!["0xabc".to_string(), "0xdef".to_string()];
        let msgs: Vec<Value> = build_subscribe_messages(&wallets)
            .iter()
            .map(|m| serde_json::from_str(m).unwrap())
            .collect();

        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0]["subscription"], json!({"type": "userFills", "user": "0xabc"}));
        assert_eq!(msgs[1]["subscription"], json!({"type": "userEvents", "user": "0xabc"}));
        assert_eq!(msgs[3]["subscription"]["user"], "0xdef");
        assert!(msgs.iter().all(|m| m["method"] == "subscribe"));
    }

    #[test]
    fn test_fill_list_frame() {
        let frame = classify_frame(
            &json!({"channel": "userFills", "data": [
                {"user": "0xABC", "hash": "0x1", "coin": "BTC"},
                {"coin": "ETH", "hash": "0x2"},
                {"address": "0xdef", "hash": "0x3"},
            ]})
            .to_string(),
        )
        .unwrap();

        let StreamFrame::Fills(fills) = frame else {
            panic!("expected fills");
        };
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].wallet, "0xabc");
        assert_eq!(fills[0].payload["hash"], "0x1");
        assert_eq!(fills[1].wallet, "0xdef");
    }

    #[test]
    fn test_wrapped_fill_frame_uses_outer_user() {
        let frame = classify_message(&json!({"channel": "userFills", "data": {
            "user": "0xAbC", "fills": [{"hash": "0x1"}, {"hash": "0x2", "user": "0xdef"}]
        }}));
        let StreamFrame::Fills(fills) = frame else {
            panic!("expected fills");
        };
        assert_eq!(fills[0].wallet, "0xabc");
        assert_eq!(fills[1].wallet, "0xdef");
    }

    #[test]
    fn test_snapshot_marker_suppresses_frame() {
        let top = json!({"channel": "userFills", "isSnapshot": true, "data": [{"user": "0xabc", "hash": "0x1"}]});
        assert_eq!(classify_message(&top), StreamFrame::Snapshot);

        let nested = json!({"channel": "userFills", "data": {"isSnapshot": true, "user": "0xabc", "fills": [{"hash": "0x1"}]}});
        assert_eq!(classify_message(&nested), StreamFrame::Snapshot);

        let not_snapshot = json!({"channel": "userFills", "isSnapshot": false, "data": []});
        assert_eq!(classify_message(&not_snapshot), StreamFrame::Fills(vec![]));
    }

    #[test]
    fn test_events_channel_any_payload() {
        for data in [json!({"fills": []}), json!([1, 2]), json!(null), json!("liquidation")] {
            let msg = json!({"channel": "userEvents", "data": data});
            assert_eq!(classify_message(&msg), StreamFrame::UserEvent);
        }
    }

    #[test]
    fn test_other_frames_ignored() {
        assert_eq!(classify_message(&json!([1, 2, 3])), StreamFrame::Ignored);
        assert_eq!(classify_message(&json!("hello")), StreamFrame::Ignored);
        assert_eq!(
            classify_message(&json!({"channel": "subscriptionResponse", "data": {"method": "subscribe"}})),
            StreamFrame::Ignored
        );
        assert_eq!(
            classify_message(&json!({"channel": "userFills", "data": "oops"})),
            StreamFrame::Ignored
        );
    }

    #[test]
    fn test_undecodable_frame_is_upstream_failure() {
        let err = classify_frame("{not json").unwrap_err();
        assert!(matches!(err, IngestError::UpstreamUnavailable(_)));
    }
}
