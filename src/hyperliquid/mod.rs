pub mod info_client;
pub mod types;

pub use info_client::{InfoClient, InfoClientError};
pub use types::{InfoRequest, WsSubscribe, EVENTS_CHANNEL, FILLS_CHANNEL};
