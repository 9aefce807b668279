// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
//   α     = 2 / (period + 1)
//   EMA_0 = close_0
//   EMA_t = EMA_{t-1} + α (close_t - EMA_{t-1})
//
// Seeded with the oldest close of the window, so the result depends on where
// the window starts; callers always pass the whole normalized series.
// =============================================================================

use crate::error::AnalysisError;
use crate::market_data::{closes, Candle};

/// EMA series, one value per close.  Empty when `period` is zero or longer
/// than the input.
pub fn calculate_ema(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    closes
        .iter()
        .scan(None::<f64>, |prev, &close| {
            let next = prev.map_or(close, |p| p + alpha * (close - p));
            *prev = Some(next);
            Some(next)
        })
        .collect()
}

/// Latest EMA of the candle closes; `InsufficientData` below `period` candles.
pub fn ema(candles: &[Candle], period: usize) -> Result<f64, AnalysisError> {
    calculate_ema(&closes(candles), period)
        .last()
        .copied()
        .ok_or_else(|| AnalysisError::insufficient(format!("EMA({period})"), period.max(1), candles.len()))
}
