// =============================================================================
// Qualitative State Classifiers
// =============================================================================
//
// Deterministic threshold functions turning raw indicator numbers into the
// categorical states the decision rules and the presentation layer read.
// Every threshold comes from `AnalysisConfig`.
// =============================================================================

use crate::config::AnalysisConfig;
use crate::indicators::BollingerResult;
use crate::types::{Interpretation, MarketTrend, PricePosition, RsiSlope, RsiZone};

/// OVERSOLD below `rsi_oversold`, OVERBOUGHT above `rsi_overbought`.
pub fn rsi_zone(rsi: f64, config: &AnalysisConfig) -> RsiZone {
    if rsi < config.rsi_oversold {
        RsiZone::Oversold
    } else if rsi > config.rsi_overbought {
        RsiZone::Overbought
    } else {
        RsiZone::Neutral
    }
}

/// Direction of the RSI versus its value one candle earlier.
///
/// Without an earlier value the slope is FLAT.
pub fn rsi_slope(current: f64, previous: Option<f64>, tolerance: f64) -> RsiSlope {
    match previous {
        Some(prev) if current - prev > tolerance => RsiSlope::Rising,
        Some(prev) if prev - current > tolerance => RsiSlope::Falling,
        _ => RsiSlope::Flat,
    }
}

/// Extremes read as reversal potential; inside the neutral zone the slope
/// decides.
pub fn rsi_interpretation(zone: RsiZone, slope: RsiSlope) -> Interpretation {
    match (zone, slope) {
        (RsiZone::Oversold, _) => Interpretation::Bullish,
        (RsiZone::Overbought, _) => Interpretation::Bearish,
        (RsiZone::Neutral, RsiSlope::Rising) => Interpretation::Bullish,
        (RsiZone::Neutral, RsiSlope::Falling) => Interpretation::Bearish,
        (RsiZone::Neutral, RsiSlope::Flat) => Interpretation::Neutral,
    }
}

/// Price above a reference level is bullish, below is bearish.
pub fn price_vs_level(price: f64, level: f64) -> Interpretation {
    if price > level {
        Interpretation::Bullish
    } else if price < level {
        Interpretation::Bearish
    } else {
        Interpretation::Neutral
    }
}

/// Market trend from EMA alignment and Bollinger bandwidth.
///
/// Evaluated top-to-bottom; first match wins:
///   1. HIGH_VOLATILITY: bandwidth > `volatility_threshold`
///   2. BULLISH        : price above every EMA
///   3. BEARISH        : price below every EMA
///   4. LATERAL        : anything mixed, or no EMAs to compare against
pub fn classify_trend(
    price: f64,
    emas: Option<&[f64; 3]>,
    bandwidth: Option<f64>,
    config: &AnalysisConfig,
) -> MarketTrend {
    if bandwidth.is_some_and(|b| b > config.volatility_threshold) {
        return MarketTrend::HighVolatility;
    }
    match emas {
        Some(emas) if emas.iter().all(|&e| price > e) => MarketTrend::Bullish,
        Some(emas) if emas.iter().all(|&e| price < e) => MarketTrend::Bearish,
        _ => MarketTrend::Lateral,
    }
}

pub fn price_position(price: f64, bands: &BollingerResult) -> PricePosition {
    if price > bands.upper {
        PricePosition::AboveUpper
    } else if price >= bands.middle {
        PricePosition::AboveMiddle
    } else if price >= bands.lower {
        PricePosition::BelowMiddle
    } else {
        PricePosition::BelowLower
    }
}

pub fn volume_interpretation(relative_volume: f64, config: &AnalysisConfig) -> Interpretation {
    if relative_volume > config.volume_bullish_ratio {
        Interpretation::Bullish
    } else if relative_volume < config.volume_bearish_ratio {
        Interpretation::Bearish
    } else {
        Interpretation::Neutral
    }
}
