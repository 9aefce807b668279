use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single normalized OHLCV candle.
///
/// Produced only by [`crate::market_data::normalize_candles`]; after that all
/// prices and the volume are finite and non-negative, `high >= max(open,
/// close)` and `low <= min(open, close)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl Candle {
    /// `(high + low + close) / 3`, the price VWAP weights by volume.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Largest of the bar's own range and its gaps from the previous close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        (self.high - self.low)
            .max((self.high - prev_close).abs())
            .max((self.low - prev_close).abs())
    }
}

/// Timestamp exactly as the caller sent it: epoch milliseconds, a date
/// string, or anything else (kept so the normalizer can repair it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(f64),
    Text(String),
    Unrecognized(Value),
}

/// Untrusted candle as received from an upstream caller.  Any field may be
/// missing, `null` or of the wrong type; the normalizer repairs it instead
/// of rejecting the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCandle {
    #[serde(deserialize_with = "lenient_number")]
    pub open: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub high: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub low: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub close: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub volume: Option<f64>,
    pub timestamp: Option<RawTimestamp>,
}

/// Numbers pass through and numeric strings are parsed; every other JSON
/// value reads as missing.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

impl From<&Candle> for RawCandle {
    fn from(c: &Candle) -> Self {
        Self {
            open: Some(c.open),
            high: Some(c.high),
            low: Some(c.low),
            close: Some(c.close),
            volume: Some(c.volume),
            timestamp: Some(RawTimestamp::Millis(c.timestamp as f64)),
        }
    }
}

/// Close prices of a series, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}
