// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the population standard deviation
// of the closes in the window.  The bandwidth is the normalised distance:
// (upper - lower) / middle, a fraction (0.01 = 1 %).
//
// Bandwidth drives the HIGH_VOLATILITY trend classification.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::market_data::{closes, Candle};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub bandwidth: f64,
}

/// Calculate Bollinger Bands over the last `period` closes.
///
/// A zero middle band (all closes zero) yields a bandwidth of 0.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerResult> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;

    let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
    let std_dev = variance.sqrt();

    let upper = middle + num_std * std_dev;
    let lower = middle - num_std * std_dev;
    let bandwidth = if middle == 0.0 {
        0.0
    } else {
        (upper - lower) / middle
    };

    Some(BollingerResult {
        upper,
        middle,
        lower,
        bandwidth,
    })
}

/// Bollinger Bands over candle closes.
pub fn bollinger(candles: &[Candle], period: usize, num_std: f64) -> Result<BollingerResult, AnalysisError> {
    calculate_bollinger(&closes(candles), period, num_std).ok_or_else(|| {
        AnalysisError::insufficient(format!("Bollinger({period})"), period.max(1), candles.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_sigma_around_sma() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert!((bb.middle - 10.5).abs() < 1e-12);
        // population variance of 1..=20 = (20^2 - 1) / 12
        let sigma = (399.0_f64 / 12.0).sqrt();
        assert!((bb.upper - (10.5 + 2.0 * sigma)).abs() < 1e-10);
        assert!((bb.lower - (10.5 - 2.0 * sigma)).abs() < 1e-10);
        assert!((bb.bandwidth - 4.0 * sigma / 10.5).abs() < 1e-10);
    }

    #[test]
    fn only_latest_window_counts() {
        let mut closes = vec![1000.0; 10];
        closes.extend(vec![5.0; 20]);
        let bb = calculate_bollinger(&closes, 20, 2.0).unwrap();
        assert_eq!(bb.middle, 5.0);
        assert_eq!(bb.bandwidth, 0.0);
    }

    #[test]
    fn window_longer_than_series_is_none() {
        assert!(calculate_bollinger(&[1.0, 2.0, 3.0], 20, 2.0).is_none());
    }

    #[test]
    fn zero_middle_has_zero_bandwidth() {
        let bb = calculate_bollinger(&[0.0; 20], 20, 2.0).unwrap();
        assert_eq!(bb.bandwidth, 0.0);
    }

    #[test]
    fn short_candle_series_is_insufficient_data() {
        let candles = vec![
            Candle {
                open: 1.0,
                high: 1.0,
                low: 1.0,
                close: 1.0,
                volume: 1.0,
                timestamp: 0,
            };
            5
        ];
        assert_eq!(
            bollinger(&candles, 20, 2.0).unwrap_err(),
            AnalysisError::insufficient("Bollinger(20)", 20, 5)
        );
    }
}
