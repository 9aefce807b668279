// =============================================================================
// Fibonacci Retracement Levels
// =============================================================================
//
// Levels are measured down from the highest high H of the window towards the
// lowest low L:
//
//   level(r) = H - (H - L) * r,   r ∈ {0, 0.236, 0.382, 0.5, 0.618, 0.786, 1}
//
// so level 0 % is the window high and level 100 % the window low.  The nearest
// level is the one with the smallest absolute distance to the latest close;
// its distance is reported as a fraction of that close.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::market_data::Candle;

pub const FIB_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

const FIB_LABELS: [&str; 7] = ["0%", "23.6%", "38.2%", "50%", "61.8%", "78.6%", "100%"];

/// Price of every retracement level plus the one nearest to the latest close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibonacciResult {
    /// Level prices in [`FIB_RATIOS`] order.
    pub levels: [f64; 7],
    pub nearest_label: &'static str,
    pub nearest_price: f64,
    /// `|close - nearest_price| / close`; 0 when the close is 0.
    pub distance: f64,
}

pub fn calculate_fibonacci(candles: &[Candle]) -> Result<FibonacciResult, AnalysisError> {
    let last = candles
        .last()
        .ok_or_else(|| AnalysisError::insufficient("Fibonacci", 1, 0))?;

    let high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let range = high - low;

    let levels = FIB_RATIOS.map(|r| high - range * r);

    // First level wins ties, so a flat window reports "0%".
    let (nearest_idx, nearest_price) = levels
        .iter()
        .copied()
        .enumerate()
        .fold((0, levels[0]), |best, (i, price)| {
            if (price - last.close).abs() < (best.1 - last.close).abs() {
                (i, price)
            } else {
                best
            }
        });

    let distance = if last.close == 0.0 {
        0.0
    } else {
        (last.close - nearest_price).abs() / last.close
    };

    Ok(FibonacciResult {
        levels,
        nearest_label: FIB_LABELS[nearest_idx],
        nearest_price,
        distance,
    })
}
