// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
//   gain_t, loss_t = max(Δclose, 0), max(-Δclose, 0)
//   avg_gain, avg_loss = Wilder smoothing over `period`
//   RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//
// Degenerate averages resolve to boundary values, never NaN / Infinity:
//   avg_loss == 0, avg_gain > 0  => 100
//   avg_gain == 0, avg_loss > 0  => 0
//   both zero                    => 50
// =============================================================================

use super::smoothing::wilder_series;
use crate::error::AnalysisError;
use crate::market_data::{closes, Candle};

/// RSI for every close from index `period` onward.
///
/// Empty when `period` is zero or fewer than `period + 1` closes are given.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    wilder_series(&gains, period)
        .into_iter()
        .zip(wilder_series(&losses, period))
        .map(|(avg_gain, avg_loss)| from_averages(avg_gain, avg_loss))
        .collect()
}

/// RSI series over candle closes; `InsufficientData` below `period + 1` candles.
pub fn rsi_series(candles: &[Candle], period: usize) -> Result<Vec<f64>, AnalysisError> {
    let series = calculate_rsi(&closes(candles), period);
    if series.is_empty() {
        return Err(AnalysisError::insufficient(
            format!("RSI({period})"),
            period.saturating_add(1),
            candles.len(),
        ));
    }
    Ok(series)
}

/// Latest RSI value.
pub fn rsi(candles: &[Candle], period: usize) -> Result<f64, AnalysisError> {
    rsi_series(candles, period)?
        .last()
        .copied()
        .ok_or_else(|| AnalysisError::insufficient(format!("RSI({period})"), period.saturating_add(1), candles.len()))
}

fn from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (false, true) => 100.0,
        (true, false) => 0.0,
        (false, false) => (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle {
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
                timestamp: i as i64 * 60_000,
            })
            .collect()
    }

    // ---- boundaries --------------------------------------------------------

    #[test]
    fn needs_period_plus_one_closes() {
        let closes: Vec<f64> = (0..14).map(|i| 1.08 + i as f64 * 0.001).collect();
        assert!(calculate_rsi(&closes, 14).is_empty());
        assert!(calculate_rsi(&closes, 0).is_empty());
        assert_eq!(calculate_rsi(&closes, 13).len(), 1);
    }

    #[test]
    fn steady_rise_pins_to_100() {
        let closes: Vec<f64> = (0..40).map(|i| 1.0500 + i as f64 * 0.0005).collect();
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series.len(), 26);
        assert!(series.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn rise_with_pauses_still_100() {
        let closes = [1.20, 1.20, 1.21, 1.21, 1.22, 1.22, 1.22, 1.23, 1.23, 1.23, 1.24, 1.24, 1.24, 1.25, 1.25];
        assert_eq!(calculate_rsi(&closes, 14), vec![100.0]);
    }

    #[test]
    fn steady_fall_pins_to_0() {
        let closes: Vec<f64> = (0..40).map(|i| 1.1000 - i as f64 * 0.0005).collect();
        assert!(calculate_rsi(&closes, 14).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn no_movement_is_50() {
        assert!(calculate_rsi(&[1.0850; 25], 14).iter().all(|&v| v == 50.0));
    }

    // ---- values ------------------------------------------------------------

    #[test]
    fn one_third_ratio_gives_25() {
        // 13 losses of 1 and one gain of 13/3: avg_gain / avg_loss = 1/3.
        let mut closes: Vec<f64> = (0..14).map(|i| 100.0 - i as f64).collect();
        closes.push(87.0 + 13.0 / 3.0);
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series.len(), 1);
        assert!((series[0] - 25.0).abs() < 1e-9, "got {}", series[0]);
    }

    #[test]
    fn wilder_carries_history_forward() {
        // period 2: deltas +2, -1 seed gain 1 / loss 0.5 => 66.67;
        // next delta +1: gain 1, loss 0.25 => 80.
        let series = calculate_rsi(&[10.0, 12.0, 11.0, 12.0], 2);
        assert!((series[0] - 200.0 / 3.0).abs() < 1e-9);
        assert!((series[1] - 80.0).abs() < 1e-9);
    }

    #[test]
    fn always_within_bounds() {
        for seed in 1..30 {
            let closes: Vec<f64> = (0..80)
                .map(|i| 1.08 + ((i * seed) as f64 * 0.21).sin() * 0.01 + i as f64 * 0.0001)
                .collect();
            for period in [2, 7, 14, 30] {
                for v in calculate_rsi(&closes, period) {
                    assert!(v.is_finite() && (0.0..=100.0).contains(&v), "RSI {v}");
                }
            }
        }
    }

    // ---- candle wrappers ---------------------------------------------------

    #[test]
    fn candle_series_matches_close_series() {
        let closes: Vec<f64> = (0..40).map(|i| 1.09 + (i as f64 * 0.6).sin() * 0.002).collect();
        let candles = candles_from(&closes);
        assert_eq!(rsi_series(&candles, 14).unwrap(), calculate_rsi(&closes, 14));
        assert_eq!(rsi(&candles, 14).unwrap(), *calculate_rsi(&closes, 14).last().unwrap());
    }

    #[test]
    fn short_candle_series_is_insufficient_data() {
        let candles = candles_from(&[1.0; 10]);
        assert_eq!(
            rsi(&candles, 14).unwrap_err(),
            AnalysisError::insufficient("RSI(14)", 15, 10)
        );
    }
}
