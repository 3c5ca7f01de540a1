//! Fill normalization and insert-or-ignore persistence.

use metrics::counter;
use serde_json::Value;

use super::normalizer::{decimal_field, first_present, value_to_string};
use super::ports::{AccountStateSource, PersistenceSink};
use crate::errors::IngestError;
use crate::models::{normalize_address, NewFill};

const WALLET_KEYS: &[&str] = &["user", "address"];
const FILL_ID_KEYS: &[&str] = &["hash", "oid", "tid"];
const TIME_KEYS: &[&str] = &["time", "ts"];
const COIN_KEYS: &[&str] = &["coin"];
const SIDE_KEYS: &[&str] = &["side", "dir"];
const PX_KEYS: &[&str] = &["px"];
const SZ_KEYS: &[&str] = &["sz"];
const FEE_KEYS: &[&str] = &["fee"];

/// Wallet a streamed fill belongs to, lowercased.
pub fn fill_wallet(fill: &Value) -> Option<String> {
    first_present(fill, WALLET_KEYS)
        .map(|v| normalize_address(&value_to_string(v)))
        .filter(|w| !w.is_empty())
}

/// Normalize one upstream fill. Never fails; unknown fields default.
pub fn normalize_fill(fill: &Value) -> NewFill {
    let fill_id = first_present(fill, FILL_ID_KEYS)
        .map(value_to_string)
        .unwrap_or_else(|| synthetic_fill_id(fill));

    NewFill {
        fill_id,
        ts: first_present(fill, TIME_KEYS).map(parse_millis).unwrap_or(0),
        coin: first_present(fill, COIN_KEYS)
            .map(value_to_string)
            .unwrap_or_default(),
        side: first_present(fill, SIDE_KEYS)
            .map(|v| normalize_side(&value_to_string(v)))
            .unwrap_or_default(),
        px: decimal_field(fill, PX_KEYS),
        sz: decimal_field(fill, SZ_KEYS),
        fee: decimal_field(fill, FEE_KEYS),
        raw: fill.to_string(),
    }
}

/// `{time}-{coin}-{px}-{sz}` for fills carrying no upstream identifier.
fn synthetic_fill_id(fill: &Value) -> String {
    let part = |key: &str| fill.get(key).map(value_to_string).unwrap_or_default();
    format!("{}-{}-{}-{}", part("time"), part("coin"), part("px"), part("sz"))
}

/// Hyperliquid reports `B`/`A` (bid/ask); other feeds use words. Unknown
/// directions such as `Open Long` are kept verbatim.
fn normalize_side(raw: &str) -> String {
    let raw = raw.trim();
    match raw.to_uppercase().as_str() {
        "B" | "BUY" | "BID" => "BUY".into(),
        "A" | "SELL" | "ASK" => "SELL".into(),
        _ => raw.to_string(),
    }
}

fn parse_millis(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Insert-or-ignore one fill, recording whether it was new.
pub async fn persist_fill<P: PersistenceSink>(
    sink: &P,
    wallet: &str,
    fill: &NewFill,
) -> Result<bool, IngestError> {
    let inserted = sink.insert_fill_if_absent(wallet, fill).await?;
    if inserted {
        counter!("fills_inserted_total").increment(1);
        tracing::debug!(
            wallet,
            fill_id = %fill.fill_id,
            coin = %fill.coin,
            side = %fill.side,
            px = %fill.px,
            sz = %fill.sz,
            "Fill stored"
        );
    } else {
        counter!("fills_duplicate_total").increment(1);
        tracing::trace!(wallet, fill_id = %fill.fill_id, "Duplicate fill ignored");
    }
    Ok(inserted)
}

/// Pull the wallet's recent fills over REST and insert any that are missing.
/// Returns the number of new rows.
pub async fn backfill_fills<S, P>(source: &S, sink: &P, wallet: &str) -> Result<usize, IngestError>
where
    S: AccountStateSource,
    P: PersistenceSink,
{
    let payload = source.fetch_user_fills(wallet, None).await?;
    let Some(items) = payload.as_array() else {
        tracing::debug!(wallet, "Fill backfill returned no list, skipping");
        return Ok(0);
    };

    let mut inserted = 0;
    for item in items.iter().filter(|item| item.is_object()) {
        if persist_fill(sink, wallet, &normalize_fill(item)).await? {
            inserted += 1;
        }
    }

    tracing::info!(wallet, fetched = items.len(), inserted, "Fill backfill complete");
    Ok(inserted)
}
