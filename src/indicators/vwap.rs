// =============================================================================
// Volume-Weighted Average Price (VWAP)
// =============================================================================
//
//   VWAP = Σ(typical_i × volume_i) / Σ(volume_i),  typical = (H + L + C) / 3
//
// computed over the full window.  A window with zero total volume falls back
// to the unweighted mean of the typical prices.

use crate::error::AnalysisError;
use crate::market_data::Candle;

pub fn calculate_vwap(candles: &[Candle]) -> Result<f64, AnalysisError> {
    if candles.is_empty() {
        return Err(AnalysisError::insufficient("VWAP", 1, 0));
    }

    let (sum_pv, sum_v, sum_p) = candles.iter().fold((0.0_f64, 0.0_f64, 0.0_f64), |(pv, v, p), c| {
        let typical = c.typical_price();
        (pv + typical * c.volume, v + c.volume, p + typical)
    });

    if sum_v > 0.0 {
        Ok(sum_pv / sum_v)
    } else {
        Ok(sum_p / candles.len() as f64)
    }
}
