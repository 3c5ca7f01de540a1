//! Best-effort normalization of Hyperliquid `clearinghouseState` documents.
//!
//! The upstream schema has drifted across API versions. Every logical value
//! is looked up through an ordered table of candidate field names, and any
//! value that is missing or not numeric resolves to zero. Normalization
//! never fails.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::models::{AccountSnapshot, PositionSide, SnapshotPosition, SnapshotSummary};

const SUMMARY_KEYS: &[&str] = &["marginSummary", "crossMarginSummary"];
const ACCOUNT_VALUE_KEYS: &[&str] = &["accountValue", "totalNtlPos"];
const MARGIN_USED_KEYS: &[&str] = &["marginUsed", "totalMarginUsed"];
const SUMMARY_UPNL_KEYS: &[&str] = &["unrealizedPnl", "totalUnrealizedPnl"];

const POSITIONS_KEY: &str = "assetPositions";
const NESTED_POSITION_KEYS: &[&str] = &["position", "pos"];
const COIN_KEYS: &[&str] = &["coin"];
const SIGNED_SIZE_KEYS: &[&str] = &["szi", "size"];
const ENTRY_PX_KEYS: &[&str] = &["entryPx", "entry_px"];
const MARK_PX_KEYS: &[&str] = &["markPx", "mark_px"];
const LIQ_PX_KEYS: &[&str] = &["liqPx", "liq_px"];
const LEVERAGE_KEYS: &[&str] = &["leverage", "lev"];
const POSITION_UPNL_KEYS: &[&str] = &["unrealizedPnl", "upnl"];

/// Normalize one raw account-state document.
pub fn normalize_snapshot(doc: &Value) -> AccountSnapshot {
    let positions: Vec<SnapshotPosition> = doc
        .get(POSITIONS_KEY)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_position).collect())
        .unwrap_or_default();

    let positions_upnl = saturating_sum(positions.iter().map(|p| p.unrealized_pnl));

    let summary = match first_present(doc, SUMMARY_KEYS) {
        Some(obj) => SnapshotSummary {
            account_value: decimal_field(obj, ACCOUNT_VALUE_KEYS),
            margin_used: decimal_field(obj, MARGIN_USED_KEYS),
            unrealized_pnl: first_present(obj, SUMMARY_UPNL_KEYS)
                .map(parse_decimal)
                .unwrap_or(positions_upnl),
        },
        None => SnapshotSummary {
            unrealized_pnl: positions_upnl,
            ..SnapshotSummary::default()
        },
    };

    AccountSnapshot { summary, positions }
}

/// Sum that clamps at `Decimal::MAX`/`MIN` instead of panicking on overflow.
fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).unwrap_or(if v.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
    })
}

/// Elements without a coin are dropped: (wallet, coin) is the row key.
fn normalize_position(item: &Value) -> Option<SnapshotPosition> {
    let pos = first_present(item, NESTED_POSITION_KEYS)
        .filter(|v| v.is_object())
        .unwrap_or(item);

    let coin = first_present(pos, COIN_KEYS)
        .or_else(|| first_present(item, COIN_KEYS))
        .map(value_to_string)?;
    if coin.is_empty() {
        return None;
    }

    let signed_size = decimal_field(pos, SIGNED_SIZE_KEYS);

    Some(SnapshotPosition {
        coin,
        side: PositionSide::from_signed(signed_size),
        size: signed_size.abs(),
        entry_px: decimal_field(pos, ENTRY_PX_KEYS),
        mark_px: decimal_field(pos, MARK_PX_KEYS),
        liq_px: decimal_field(pos, LIQ_PX_KEYS),
        leverage: leverage_field(pos),
        unrealized_pnl: decimal_field(pos, POSITION_UPNL_KEYS),
    })
}

/// Leverage is either a plain number or `{"type": "cross", "value": 20}`.
fn leverage_field(pos: &Value) -> Decimal {
    match first_present(pos, LEVERAGE_KEYS) {
        Some(Value::Object(obj)) => obj.get("value").map(parse_decimal).unwrap_or_default(),
        Some(other) => parse_decimal(other),
        None => Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Field lookup helpers (shared with fill normalization)
// ---------------------------------------------------------------------------

/// First candidate that is present and non-empty. Null, `false`, numeric
/// zero, empty strings and empty containers fall through to the next name.
pub(crate) fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub(crate) fn decimal_field(obj: &Value, keys: &[&str]) -> Decimal {
    first_present(obj, keys).map(parse_decimal).unwrap_or_default()
}

/// Numbers may arrive as JSON numbers or numeric strings; anything else is 0.
pub(crate) fn parse_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_decimal_str(&n.to_string()),
        Value::String(s) => parse_decimal_str(s.trim()),
        _ => Decimal::ZERO,
    }
}

fn parse_decimal_str(s: &str) -> Decimal {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or_default()
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
