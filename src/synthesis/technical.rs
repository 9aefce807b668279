// =============================================================================
// Technical Analysis: raw indicator snapshot and its synthesized form
// =============================================================================
//
// `RawIndicators::compute` runs every enabled indicator over one series;
// any of them short of data aborts with `InsufficientData`.
// `TechnicalAnalysis::from_raw` then attaches the qualitative states.  The
// serialized shape (camelCase, `level_0`, `aboveEMA20`, ...) is the stable
// contract consumed by the presentation layer.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::indicators::{self, atr::atr_pct, BollingerResult, FibonacciResult};
use crate::market_data::Candle;
use crate::synthesis::states;
use crate::types::{Indicator, Interpretation, MarketTrend, PricePosition, RsiSlope, RsiZone};

// =============================================================================
// Raw indicator snapshot
// =============================================================================

/// RSI is always present; every other reading is `None` when its indicator
/// is switched off in `AnalysisConfig::indicators_enabled`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawIndicators {
    /// Latest close.
    pub price: f64,
    pub rsi: f64,
    /// RSI one candle earlier, when the series is long enough.
    pub rsi_previous: Option<f64>,
    /// Fast, medium and slow EMA, matching `AnalysisConfig::ema_periods`.
    pub emas: Option<[f64; 3]>,
    pub vwap: Option<f64>,
    pub atr: Option<f64>,
    pub bollinger: Option<BollingerResult>,
    pub fibonacci: Option<FibonacciResult>,
    pub relative_volume: Option<f64>,
}

fn when<T>(
    config: &AnalysisConfig,
    indicator: Indicator,
    compute: impl FnOnce() -> Result<T, AnalysisError>,
) -> Result<Option<T>, AnalysisError> {
    if config.is_enabled(indicator) {
        compute().map(Some)
    } else {
        Ok(None)
    }
}

impl RawIndicators {
    pub fn compute(candles: &[Candle], config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let last = candles
            .last()
            .ok_or_else(|| AnalysisError::InvalidInput("candle series is empty".into()))?;

        let rsi_series = indicators::rsi_series(candles, config.rsi_period)?;
        let rsi = rsi_series[rsi_series.len() - 1];
        let rsi_previous = rsi_series.len().checked_sub(2).map(|i| rsi_series[i]);

        let emas = when(config, Indicator::Ema, || {
            let [fast, medium, slow] = config.ema_periods;
            Ok([
                indicators::ema(candles, fast)?,
                indicators::ema(candles, medium)?,
                indicators::ema(candles, slow)?,
            ])
        })?;

        let raw = Self {
            price: last.close,
            rsi,
            rsi_previous,
            emas,
            vwap: when(config, Indicator::Vwap, || indicators::calculate_vwap(candles))?,
            atr: when(config, Indicator::Atr, || {
                indicators::calculate_atr(candles, config.atr_period)
            })?,
            bollinger: when(config, Indicator::Bollinger, || {
                indicators::bollinger(candles, config.bollinger_period, config.bollinger_k)
            })?,
            fibonacci: when(config, Indicator::Fibonacci, || {
                indicators::calculate_fibonacci(candles)
            })?,
            relative_volume: when(config, Indicator::Volume, || {
                indicators::calculate_relative_volume(candles, config.volume_lookback)
            })?,
        };

        debug!(
            rsi = raw.rsi,
            emas = ?raw.emas,
            vwap = ?raw.vwap,
            atr = ?raw.atr,
            bandwidth = ?raw.bollinger.as_ref().map(|b| b.bandwidth),
            relative_volume = ?raw.relative_volume,
            "indicators computed"
        );

        Ok(raw)
    }
}

// =============================================================================
// Synthesized output
// =============================================================================

/// A single indicator reading with its directional interpretation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorValue {
    pub name: String,
    pub value: f64,
    pub interpretation: Interpretation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RsiData {
    pub name: String,
    pub value: f64,
    pub interpretation: Interpretation,
    pub description: String,
    pub slope: RsiSlope,
    pub zone: RsiZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRelation {
    #[serde(rename = "aboveEMA20")]
    pub above_fast: bool,
    #[serde(rename = "aboveEMA50")]
    pub above_medium: bool,
    #[serde(rename = "aboveEMA200")]
    pub above_slow: bool,
}

/// The `ema20` / `ema50` / `ema200` slots carry the fast / medium / slow EMA
/// of whatever periods were configured; `periods` says which.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmaData {
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub periods: [usize; 3],
    pub price_relation: PriceRelation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBandsData {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub bandwidth: f64,
    pub price_position: PricePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibonacciLevels {
    pub level_0: f64,
    pub level_236: f64,
    pub level_382: f64,
    pub level_500: f64,
    pub level_618: f64,
    pub level_786: f64,
    pub level_1000: f64,
    #[serde(rename = "nearestLevel")]
    pub nearest_level: String,
    #[serde(rename = "distanceToNearest")]
    pub distance_to_nearest: f64,
}

impl From<&FibonacciResult> for FibonacciLevels {
    fn from(fib: &FibonacciResult) -> Self {
        let [l0, l236, l382, l500, l618, l786, l1000] = fib.levels;
        Self {
            level_0: l0,
            level_236: l236,
            level_382: l382,
            level_500: l500,
            level_618: l618,
            level_786: l786,
            level_1000: l1000,
            nearest_level: fib.nearest_label.to_string(),
            distance_to_nearest: fib.distance,
        }
    }
}

/// Every indicator of one series plus the overall trend. Disabled
/// indicators serialize as `null` so the key set never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAnalysis {
    /// Latest close the states were measured against.
    pub price: f64,
    pub rsi: RsiData,
    pub ema: Option<EmaData>,
    pub vwap: Option<IndicatorValue>,
    pub atr: Option<IndicatorValue>,
    pub bollinger_bands: Option<BollingerBandsData>,
    pub fibonacci: Option<FibonacciLevels>,
    pub volume_analysis: Option<IndicatorValue>,
    pub trend: MarketTrend,
}

impl TechnicalAnalysis {
    pub fn from_raw(raw: &RawIndicators, config: &AnalysisConfig) -> Self {
        let price = raw.price;

        // ── RSI ──────────────────────────────────────────────────────────
        let zone = states::rsi_zone(raw.rsi, config);
        let slope = states::rsi_slope(raw.rsi, raw.rsi_previous, config.rsi_slope_tolerance);
        let rsi_description = match zone {
            RsiZone::Oversold => format!("Oversold zone (below {})", config.rsi_oversold),
            RsiZone::Overbought => format!("Overbought zone (above {})", config.rsi_overbought),
            RsiZone::Neutral => match slope {
                RsiSlope::Rising => "Neutral zone, momentum rising".to_string(),
                RsiSlope::Falling => "Neutral zone, momentum falling".to_string(),
                RsiSlope::Flat => "Neutral zone, momentum flat".to_string(),
            },
        };
        let rsi = RsiData {
            name: format!("RSI ({})", config.rsi_period),
            value: raw.rsi,
            interpretation: states::rsi_interpretation(zone, slope),
            description: rsi_description,
            slope,
            zone,
        };

        Self {
            price,
            rsi,
            ema: raw.emas.map(|emas| ema_data(price, emas, config)),
            vwap: raw.vwap.map(|v| vwap_value(price, v)),
            atr: raw.atr.map(|atr| IndicatorValue {
                name: format!("ATR ({})", config.atr_period),
                value: atr,
                interpretation: Interpretation::Neutral,
                description: Some(format!("ATR is {:.2}% of price", atr_pct(atr, price))),
            }),
            bollinger_bands: raw.bollinger.as_ref().map(|bands| BollingerBandsData {
                upper: bands.upper,
                middle: bands.middle,
                lower: bands.lower,
                bandwidth: bands.bandwidth,
                price_position: states::price_position(price, bands),
            }),
            fibonacci: raw.fibonacci.as_ref().map(FibonacciLevels::from),
            volume_analysis: raw.relative_volume.map(|rv| volume_value(rv, config)),
            trend: states::classify_trend(
                price,
                raw.emas.as_ref(),
                raw.bollinger.as_ref().map(|b| b.bandwidth),
                config,
            ),
        }
    }

    /// Compute indicators over `candles` and synthesize them in one step.
    pub fn from_candles(candles: &[Candle], config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let raw = RawIndicators::compute(candles, config)?;
        Ok(Self::from_raw(&raw, config))
    }
}

fn ema_data(price: f64, [fast, medium, slow]: [f64; 3], config: &AnalysisConfig) -> EmaData {
    EmaData {
        ema20: fast,
        ema50: medium,
        ema200: slow,
        periods: config.ema_periods,
        price_relation: PriceRelation {
            above_fast: price > fast,
            above_medium: price > medium,
            above_slow: price > slow,
        },
    }
}

fn vwap_value(price: f64, vwap: f64) -> IndicatorValue {
    let interpretation = states::price_vs_level(price, vwap);
    let description = match interpretation {
        Interpretation::Bullish => "Price above VWAP",
        Interpretation::Bearish => "Price below VWAP",
        Interpretation::Neutral => "Price at VWAP",
    };
    IndicatorValue {
        name: "VWAP".to_string(),
        value: vwap,
        interpretation,
        description: Some(description.to_string()),
    }
}

fn volume_value(relative_volume: f64, config: &AnalysisConfig) -> IndicatorValue {
    let interpretation = states::volume_interpretation(relative_volume, config);
    let pct = (relative_volume - 1.0) * 100.0;
    let description = match interpretation {
        Interpretation::Bullish => format!(
            "Volume {:.0}% above the {}-period average",
            pct, config.volume_lookback
        ),
        Interpretation::Bearish => format!(
            "Volume {:.0}% below the {}-period average",
            -pct, config.volume_lookback
        ),
        Interpretation::Neutral => format!(
            "Volume in line with the {}-period average",
            config.volume_lookback
        ),
    };
    IndicatorValue {
        name: format!("Volume ({})", config.volume_lookback),
        value: relative_volume,
        interpretation,
        description: Some(description),
    }
}
