// =============================================================================
// Analysis Assembler: one candle window in, one AnalysisResult out
// =============================================================================
//
// Pipeline:
//   1. Resolve and validate the configuration (request bundle or defaults)
//   2. Reject windows shorter than the RSI needs (InvalidInput)
//   3. Keep the newest `max_candles` raw candles and normalize them
//   4. Compute + synthesize every enabled indicator (InsufficientData aborts)
//   5. Run the decision engine
//   6. Package market data, analysis and decision
//
// Stateless: each call owns its series and returns a fresh result.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::decision::{Decision, DecisionEngine};
use crate::error::AnalysisError;
use crate::market_data::{normalize_candles, Candle, RawCandle};
use crate::synthesis::TechnicalAnalysis;
use crate::types::Timeframe;

// =============================================================================
// Request
// =============================================================================

/// Everything a caller may send for one analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub candles: Vec<RawCandle>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub spread: Option<f64>,
    /// Overrides the caller-independent defaults for this request only.
    #[serde(default)]
    pub config: Option<AnalysisConfig>,
}

impl AnalysisRequest {
    pub fn new(candles: Vec<RawCandle>) -> Self {
        Self {
            candles,
            ..Self::default()
        }
    }

    /// Parse an untrusted JSON body, naming exactly what is wrong with it.
    pub fn from_json(body: &Value) -> Result<Self, AnalysisError> {
        let object = body
            .as_object()
            .ok_or_else(|| AnalysisError::InvalidInput("request body must be a JSON object".into()))?;

        let candles = match object.get("candles") {
            None | Some(Value::Null) => {
                return Err(AnalysisError::InvalidInput("candles are required".into()));
            }
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    if !item.is_object() {
                        return Err(AnalysisError::InvalidInput(format!("candle {i} must be an object")));
                    }
                    RawCandle::deserialize(item)
                        .map_err(|e| AnalysisError::InvalidInput(format!("candle {i} is malformed: {e}")))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => {
                return Err(AnalysisError::InvalidInput("candles must be an array".into()));
            }
        };

        let symbol = optional_field::<String>(object, "symbol")?;
        let timeframe = optional_field::<Timeframe>(object, "timeframe")?;
        let spread = optional_field::<f64>(object, "spread")?;
        let config = match object.get("config") {
            None | Some(Value::Null) => None,
            Some(value) => Some(AnalysisConfig::from_json(value)?),
        };

        Ok(Self {
            candles,
            symbol,
            timeframe,
            spread,
            config,
        })
    }
}

fn optional_field<T: serde::de::DeserializeOwned>(
    object: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<T>, AnalysisError> {
    match object.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|e| AnalysisError::InvalidInput(format!("{name} is malformed: {e}"))),
    }
}

// =============================================================================
// Result
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Snapshot of the latest candle of the analysed window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketData {
    pub symbol: Option<String>,
    pub timeframe: Option<Timeframe>,
    /// RFC 3339 time of the latest candle.
    pub timestamp: String,
    pub ohlc: Ohlc,
    pub volume: f64,
    pub spread: f64,
}

impl MarketData {
    fn from_window(candles: &[Candle], request: &AnalysisRequest) -> Option<Self> {
        let last = candles.last()?;
        Some(Self {
            symbol: request.symbol.clone(),
            timeframe: request.timeframe.or_else(|| infer_timeframe(candles)),
            timestamp: DateTime::<Utc>::from_timestamp_millis(last.timestamp)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            ohlc: Ohlc {
                open: last.open,
                high: last.high,
                low: last.low,
                close: last.close,
            },
            volume: last.volume,
            spread: request.spread.filter(|s| s.is_finite() && *s >= 0.0).unwrap_or(0.0),
        })
    }
}

/// Complete, immutable output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// UUID v4 identifying this run.
    pub id: String,
    pub market_data: MarketData,
    pub technical_analysis: TechnicalAnalysis,
    pub decision: Decision,
    pub processed_at: String,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Run the full pipeline.  `defaults` applies unless the request carries its
/// own configuration bundle.
pub fn analyze(request: &AnalysisRequest, defaults: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    analyze_at(request, defaults, Utc::now())
}

/// Same as [`analyze`] with an explicit clock.
pub fn analyze_at(
    request: &AnalysisRequest,
    defaults: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Result<AnalysisResult, AnalysisError> {
    // ── 1. Configuration ─────────────────────────────────────────────────
    let config = request.config.as_ref().unwrap_or(defaults);
    config.validate()?;

    // ── 2. Input length gate ─────────────────────────────────────────────
    let received = request.candles.len();
    let minimum = config.min_input_candles();
    if received < minimum {
        return Err(AnalysisError::InvalidInput(format!(
            "insufficient data: at least {minimum} candles are required, got {received}"
        )));
    }

    // ── 3. Size cap + normalization ──────────────────────────────────────
    let start = received.saturating_sub(config.max_candles);
    if start > 0 {
        info!(received, kept = config.max_candles, "candle window truncated to newest bars");
    }
    let candles = normalize_candles(&request.candles[start..]);

    // ── 4. Indicators ────────────────────────────────────────────────────
    let technical_analysis = TechnicalAnalysis::from_candles(&candles, config)?;

    // ── 5. Decision ──────────────────────────────────────────────────────
    let decision = DecisionEngine::decide_at(&technical_analysis, config, now);

    // ── 6. Package ───────────────────────────────────────────────────────
    let market_data = MarketData::from_window(&candles, request)
        .ok_or_else(|| AnalysisError::InvalidInput("candle series is empty".into()))?;

    info!(
        symbol = market_data.symbol.as_deref().unwrap_or("-"),
        candles = candles.len(),
        decision = %decision.decision,
        confidence = decision.confidence,
        trend = %technical_analysis.trend,
        "analysis complete"
    );

    Ok(AnalysisResult {
        id: uuid::Uuid::new_v4().to_string(),
        market_data,
        technical_analysis,
        decision,
        processed_at: now.to_rfc3339(),
    })
}

/// Timeframe whose bar length equals the spacing of the last two candles.
fn infer_timeframe(candles: &[Candle]) -> Option<Timeframe> {
    match candles {
        [.., prev, last] => last
            .timestamp
            .checked_sub(prev.timestamp)
            .and_then(Timeframe::from_interval_ms),
        _ => None,
    }
}
