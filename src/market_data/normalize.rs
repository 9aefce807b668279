// =============================================================================
// Candle Normalizer
// =============================================================================
//
// Turns untrusted candles into an internally consistent OHLCV series.  It
// never rejects a candle: glitches such as negative prices, a missing high or
// an unparseable timestamp are repaired so a single bad bar cannot abort the
// analysis.  Order and length are preserved.
//
// Repairs:
//   open, close, volume  -> clamped to >= 0 (missing / NaN / inf -> 0)
//   high                 -> raised to >= max(open, close)
//   low                  -> lowered to <= min(open, close), floored at 0
//   timestamp            -> epoch ms; unparseable inherits the previous bar's
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use super::candle::{Candle, RawCandle, RawTimestamp};

/// Normalize a raw candle sequence.  Pure: `raw` is left untouched and
/// normalizing an already normalized series returns it unchanged.
pub fn normalize_candles(raw: &[RawCandle]) -> Vec<Candle> {
    let mut out = Vec::with_capacity(raw.len());
    let mut repaired = 0usize;
    let mut prev_timestamp = 0_i64;

    for (index, candle) in raw.iter().enumerate() {
        let (normalized, was_repaired) = normalize_one(candle, prev_timestamp);
        if was_repaired {
            repaired += 1;
            debug!(index, ?candle, ?normalized, "candle repaired");
        }
        prev_timestamp = normalized.timestamp;
        out.push(normalized);
    }

    if repaired > 0 {
        info!(repaired, total = raw.len(), "normalized candles with repairs");
    }

    out
}

fn normalize_one(raw: &RawCandle, prev_timestamp: i64) -> (Candle, bool) {
    let open = non_negative(raw.open);
    let close = non_negative(raw.close);
    let volume = non_negative(raw.volume);

    // A missing extreme falls back to the open before clamping.
    let high_raw = raw.high.filter(|v| v.is_finite()).unwrap_or(open);
    let low_raw = raw.low.filter(|v| v.is_finite()).unwrap_or(open);
    let high = high_raw.max(open).max(close);
    let low = low_raw.min(open).min(close).max(0.0);

    let parsed_timestamp = raw.timestamp.as_ref().and_then(parse_timestamp);
    let timestamp = parsed_timestamp.unwrap_or(prev_timestamp);

    let candle = Candle {
        open,
        high,
        low,
        close,
        volume,
        timestamp,
    };

    let unchanged = raw.open == Some(open)
        && raw.close == Some(close)
        && raw.volume == Some(volume)
        && raw.high == Some(high)
        && raw.low == Some(low)
        && parsed_timestamp.is_some();

    (candle, !unchanged)
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.max(0.0),
        _ => 0.0,
    }
}

/// Convert a caller timestamp into epoch milliseconds.
///
/// Accepts numbers (already epoch ms), numeric strings, RFC 3339 strings,
/// `YYYY-MM-DD[T| ]HH:MM:SS[.fff]` (read as UTC) and bare `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<i64> {
    match raw {
        RawTimestamp::Millis(ms) => millis_from_number(*ms),
        RawTimestamp::Text(text) => parse_timestamp_text(text.trim()),
        RawTimestamp::Unrecognized(_) => None,
    }
}

fn millis_from_number(ms: f64) -> Option<i64> {
    // i64 covers every representable date; reject values outside it.
    if ms.is_finite() && ms.abs() < 9.0e18 {
        Some(ms.trunc() as i64)
    } else {
        None
    }
}

fn parse_timestamp_text(text: &str) -> Option<i64> {
    if text.is_empty() {
        return None;
    }

    if let Ok(ms) = text.parse::<f64>() {
        return millis_from_number(ms);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}
