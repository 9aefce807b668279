// =============================================================================
// Relative Volume
// =============================================================================
//
//   RVOL = volume_latest / mean(volume of the `lookback` candles before it)
//
// The latest candle is excluded from its own baseline.  A zero baseline has
// nothing to compare against and reads as 1.0 (neutral).

use crate::error::AnalysisError;
use crate::market_data::Candle;

pub fn calculate_relative_volume(candles: &[Candle], lookback: usize) -> Result<f64, AnalysisError> {
    if lookback == 0 || candles.len() <= lookback {
        return Err(AnalysisError::insufficient(
            format!("RelativeVolume({lookback})"),
            lookback.saturating_add(1),
            candles.len(),
        ));
    }

    let latest = candles[candles.len() - 1].volume;
    let baseline = &candles[candles.len() - 1 - lookback..candles.len() - 1];
    let mean = baseline.iter().map(|c| c.volume).sum::<f64>() / lookback as f64;

    if mean == 0.0 {
        return Ok(1.0);
    }

    Ok(latest / mean)
}
