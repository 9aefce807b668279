// =============================================================================
// Average True Range (ATR)
// =============================================================================
//
//   TR_t = max(H - L, |H - prevClose|, |L - prevClose|)
//   ATR  = Wilder smoothing of TR over `period`
//
// Each TR needs the previous close, so `period + 1` candles are required.
// =============================================================================

use super::smoothing::wilder_series;
use crate::error::AnalysisError;
use crate::market_data::Candle;

/// Latest ATR of the series.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Result<f64, AnalysisError> {
    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    wilder_series(&true_ranges, period)
        .last()
        .copied()
        .ok_or_else(|| AnalysisError::insufficient(format!("ATR({period})"), period.saturating_add(1), candles.len()))
}

/// ATR as a percentage of the latest close; 0 when the close is zero.
pub fn atr_pct(atr: f64, last_close: f64) -> f64 {
    if last_close == 0.0 {
        0.0
    } else {
        atr / last_close * 100.0
    }
}
