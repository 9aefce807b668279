// =============================================================================
// Analysis Configuration: every tunable threshold of the pipeline
// =============================================================================
//
// All fields carry a serde default so a request may send a partial bundle
// (or none at all) and still get the documented defaults for the rest.
// Field names are camelCase on the wire (`rsiPeriod`, `emaPeriods`, ...).
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AnalysisError;
use crate::types::Indicator;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_rsi_period() -> usize {
    14
}

fn default_ema_periods() -> [usize; 3] {
    [20, 50, 200]
}

fn default_bollinger_period() -> usize {
    20
}

fn default_bollinger_k() -> f64 {
    2.0
}

fn default_atr_period() -> usize {
    14
}

fn default_volume_lookback() -> usize {
    20
}

fn default_confidence_floor() -> f64 {
    0.6
}

fn default_volatility_threshold() -> f64 {
    0.04
}

fn default_volume_bullish_ratio() -> f64 {
    1.2
}

fn default_volume_bearish_ratio() -> f64 {
    0.8
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_rsi_overbought() -> f64 {
    70.0
}

fn default_rsi_slope_tolerance() -> f64 {
    0.1
}

fn default_max_candles() -> usize {
    1000
}

fn default_indicators_enabled() -> Vec<Indicator> {
    Indicator::ALL.to_vec()
}

// =============================================================================
// AnalysisConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    // --- Indicator selection + look-backs ----------------------------------

    /// Indicators to compute.  RSI is mandatory; everything else may be left
    /// out, which also drops its look-back from `required_candles`.
    #[serde(default = "default_indicators_enabled")]
    pub indicators_enabled: Vec<Indicator>,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Fast, medium and slow EMA periods, in that order.  The fast EMA guards
    /// the oversold-reversal rule and the medium EMA the overbought one.
    #[serde(default = "default_ema_periods")]
    pub ema_periods: [usize; 3],

    #[serde(default = "default_bollinger_period")]
    pub bollinger_period: usize,

    /// Band half-width in standard deviations.
    #[serde(default = "default_bollinger_k")]
    pub bollinger_k: f64,

    #[serde(default = "default_atr_period")]
    pub atr_period: usize,

    /// Number of candles preceding the latest one used as the volume baseline.
    #[serde(default = "default_volume_lookback")]
    pub volume_lookback: usize,

    // --- Decision thresholds -----------------------------------------------

    /// Below this confidence any decision is forced to HOLD.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Bollinger bandwidth (fraction of the middle band) above which the
    /// market is classified HIGH_VOLATILITY.
    #[serde(default = "default_volatility_threshold")]
    pub volatility_threshold: f64,

    #[serde(default = "default_volume_bullish_ratio")]
    pub volume_bullish_ratio: f64,

    #[serde(default = "default_volume_bearish_ratio")]
    pub volume_bearish_ratio: f64,

    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,

    /// RSI changes of at most this many points count as FLAT.
    #[serde(default = "default_rsi_slope_tolerance")]
    pub rsi_slope_tolerance: f64,

    // --- Resource control --------------------------------------------------

    /// Longer series are truncated to their most recent `max_candles` bars.
    #[serde(default = "default_max_candles")]
    pub max_candles: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            indicators_enabled: default_indicators_enabled(),
            rsi_period: default_rsi_period(),
            ema_periods: default_ema_periods(),
            bollinger_period: default_bollinger_period(),
            bollinger_k: default_bollinger_k(),
            atr_period: default_atr_period(),
            volume_lookback: default_volume_lookback(),
            confidence_floor: default_confidence_floor(),
            volatility_threshold: default_volatility_threshold(),
            volume_bullish_ratio: default_volume_bullish_ratio(),
            volume_bearish_ratio: default_volume_bearish_ratio(),
            rsi_oversold: default_rsi_oversold(),
            rsi_overbought: default_rsi_overbought(),
            rsi_slope_tolerance: default_rsi_slope_tolerance(),
            max_candles: default_max_candles(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// The file may be partial; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analysis config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("rejected analysis config from {}", path.display()))?;

        info!(
            path = %path.display(),
            indicators = ?config.indicators_enabled,
            ema_periods = ?config.ema_periods,
            confidence_floor = config.confidence_floor,
            "analysis config loaded"
        );

        Ok(config)
    }

    /// Parse a bundle received over the wire (partial bundles allowed).
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AnalysisError> {
        Self::deserialize(value).map_err(|e| AnalysisError::InvalidConfig(e.to_string()))
    }

    pub fn is_enabled(&self, indicator: Indicator) -> bool {
        self.indicators_enabled.contains(&indicator)
    }

    /// Reject bundles that would make an indicator meaningless.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.is_enabled(Indicator::Rsi) {
            return Err(AnalysisError::InvalidConfig(
                "indicatorsEnabled must include RSI".into(),
            ));
        }

        let periods = [
            ("rsiPeriod", self.rsi_period),
            ("emaPeriods[0]", self.ema_periods[0]),
            ("emaPeriods[1]", self.ema_periods[1]),
            ("emaPeriods[2]", self.ema_periods[2]),
            ("bollingerPeriod", self.bollinger_period),
            ("atrPeriod", self.atr_period),
            ("volumeLookback", self.volume_lookback),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(AnalysisError::InvalidConfig(format!("{name} must be at least 1")));
        }

        if !(self.bollinger_k.is_finite() && self.bollinger_k > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "bollingerK must be a positive number, got {}",
                self.bollinger_k
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(AnalysisError::InvalidConfig(format!(
                "confidenceFloor must lie in [0, 1], got {}",
                self.confidence_floor
            )));
        }

        if !(self.volatility_threshold.is_finite() && self.volatility_threshold >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "volatilityThreshold must be a non-negative number, got {}",
                self.volatility_threshold
            )));
        }

        if !(self.volume_bearish_ratio >= 0.0 && self.volume_bearish_ratio <= self.volume_bullish_ratio) {
            return Err(AnalysisError::InvalidConfig(format!(
                "volume ratios must satisfy 0 <= volumeBearishRatio ({}) <= volumeBullishRatio ({})",
                self.volume_bearish_ratio, self.volume_bullish_ratio
            )));
        }

        if !(0.0 <= self.rsi_oversold
            && self.rsi_oversold < self.rsi_overbought
            && self.rsi_overbought <= 100.0)
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "RSI zones must satisfy 0 <= rsiOversold ({}) < rsiOverbought ({}) <= 100",
                self.rsi_oversold, self.rsi_overbought
            )));
        }

        if !(self.rsi_slope_tolerance.is_finite() && self.rsi_slope_tolerance >= 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "rsiSlopeTolerance must be a non-negative number, got {}",
                self.rsi_slope_tolerance
            )));
        }

        let required = self.required_candles();
        if self.max_candles < required {
            return Err(AnalysisError::InvalidConfig(format!(
                "maxCandles ({}) is below the largest indicator look-back ({required})",
                self.max_candles
            )));
        }

        Ok(())
    }

    /// Smallest series any decision can be made from (RSI needs `period` deltas).
    pub fn min_input_candles(&self) -> usize {
        self.rsi_period.saturating_add(1)
    }

    /// Series length needed for every enabled indicator to have data.
    /// Saturates, so absurd periods fail the `maxCandles` check instead of
    /// overflowing.
    pub fn required_candles(&self) -> usize {
        Indicator::ALL
            .into_iter()
            .filter(|&i| self.is_enabled(i))
            .map(|i| match i {
                Indicator::Rsi => self.min_input_candles(),
                Indicator::Ema => self.ema_periods.iter().copied().max().unwrap_or(1),
                Indicator::Bollinger => self.bollinger_period,
                Indicator::Atr => self.atr_period.saturating_add(1),
                Indicator::Volume => self.volume_lookback.saturating_add(1),
                Indicator::Vwap | Indicator::Fibonacci => 1,
            })
            .max()
            .unwrap_or(1)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.rsi_period, 14);
        assert_eq!(cfg.ema_periods, [20, 50, 200]);
        assert_eq!(cfg.bollinger_period, 20);
        assert!((cfg.bollinger_k - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.atr_period, 14);
        assert_eq!(cfg.volume_lookback, 20);
        assert!((cfg.confidence_floor - 0.6).abs() < f64::EPSILON);
        assert!((cfg.volume_bullish_ratio - 1.2).abs() < f64::EPSILON);
        assert!((cfg.volume_bearish_ratio - 0.8).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn required_candles_follows_slowest_indicator() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.required_candles(), 200);
        assert_eq!(cfg.min_input_candles(), 15);

        let short = AnalysisConfig {
            ema_periods: [5, 10, 15],
            bollinger_period: 15,
            volume_lookback: 10,
            ..AnalysisConfig::default()
        };
        assert_eq!(short.required_candles(), 15);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn deserialise_partial_camel_case_json_fills_defaults() {
        let json = r#"{ "rsiPeriod": 7, "emaPeriods": [9, 21, 55], "confidenceFloor": 0.7 }"#;
        let cfg: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.rsi_period, 7);
        assert_eq!(cfg.ema_periods, [9, 21, 55]);
        assert!((cfg.confidence_floor - 0.7).abs() < f64::EPSILON);
        assert_eq!(cfg.bollinger_period, 20);
        assert_eq!(cfg.max_candles, 1000);
    }

    #[test]
    fn validate_rejects_zero_period() {
        let cfg = AnalysisConfig {
            atr_period: 0,
            ..AnalysisConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(ref m) if m.contains("atrPeriod")));
    }

    #[test]
    fn validate_rejects_floor_out_of_range() {
        let cfg = AnalysisConfig {
            confidence_floor: 1.5,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_thresholds() {
        let rsi = AnalysisConfig {
            rsi_oversold: 80.0,
            ..AnalysisConfig::default()
        };
        assert!(rsi.validate().is_err());

        let volume = AnalysisConfig {
            volume_bearish_ratio: 2.0,
            ..AnalysisConfig::default()
        };
        assert!(volume.validate().is_err());
    }

    #[test]
    fn validate_rejects_cap_below_lookback() {
        let cfg = AnalysisConfig {
            max_candles: 100,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn required_candles_ignores_disabled_indicators() {
        let rsi_only = AnalysisConfig {
            indicators_enabled: vec![Indicator::Rsi],
            ..AnalysisConfig::default()
        };
        assert_eq!(rsi_only.required_candles(), 15);

        let without_ema = AnalysisConfig {
            indicators_enabled: vec![Indicator::Rsi, Indicator::Bollinger, Indicator::Volume],
            ..AnalysisConfig::default()
        };
        assert_eq!(without_ema.required_candles(), 21);
    }

    #[test]
    fn indicators_enabled_reads_upper_case_names() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{ "indicatorsEnabled": ["RSI", "VWAP"] }"#).unwrap();
        assert_eq!(cfg.indicators_enabled, vec![Indicator::Rsi, Indicator::Vwap]);
        assert!(cfg.is_enabled(Indicator::Vwap));
        assert!(!cfg.is_enabled(Indicator::Ema));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_requires_rsi() {
        let cfg = AnalysisConfig {
            indicators_enabled: vec![Indicator::Ema, Indicator::Atr],
            ..AnalysisConfig::default()
        };
        assert_eq!(
            cfg.validate().unwrap_err(),
            AnalysisError::InvalidConfig("indicatorsEnabled must include RSI".into())
        );
    }

    #[test]
    fn validate_rejects_absurd_period_without_overflow() {
        let cfg = AnalysisConfig::from_json(&serde_json::json!({ "rsiPeriod": u64::MAX })).unwrap();
        assert_eq!(cfg.min_input_candles(), usize::MAX);
        assert_eq!(cfg.required_candles(), usize::MAX);
        assert!(matches!(
            cfg.validate(),
            Err(AnalysisError::InvalidConfig(ref m)) if m.contains("maxCandles")
        ));

        let atr = AnalysisConfig {
            atr_period: usize::MAX,
            ..AnalysisConfig::default()
        };
        assert!(atr.validate().is_err());
    }

    #[test]
    fn load_reads_partial_file() {
        let path = std::env::temp_dir().join(format!("analysis_config_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "volatilityThreshold": 0.1 }"#).unwrap();
        let cfg = AnalysisConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!((cfg.volatility_threshold - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.rsi_period, 14);
    }

    #[test]
    fn load_missing_file_is_error() {
        assert!(AnalysisConfig::load("/definitely/not/here.json").is_err());
    }
}
