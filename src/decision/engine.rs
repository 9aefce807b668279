// =============================================================================
// Decision Engine: rule table → auditable decision
// =============================================================================
//
// Pipeline (pure; nothing survives between calls):
//   1. Evaluate the rule table, record the winning rule's explanation.
//   2. Confidence floor: below `confidence_floor` the decision becomes HOLD
//      and a capital-protection warning is appended.  Confidence is kept.
//   3. Context annotations from trend, volume, bands and Fibonacci levels.
//      These append text only; decision and confidence are untouched.
//   4. Probability distribution derived from the final decision.
//
// Explanations and warnings are only ever appended, so their order is the
// order in which the steps fired.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::decision::rules::{self, RuleId};
use crate::synthesis::TechnicalAnalysis;
use crate::types::{Interpretation, MarketTrend, PricePosition, TradingDecision};

/// Distance (fraction of price) under which price counts as sitting on a
/// Fibonacci level.
const FIB_PROXIMITY: f64 = 0.001;

/// Pressure weight of HOLD when splitting leftover probability mass.
const HOLD_PRESSURE: f64 = 0.5;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Probabilities {
    pub buy: f64,
    pub sell: f64,
    pub hold: f64,
}

impl Probabilities {
    pub fn sum(&self) -> f64 {
        self.buy + self.sell + self.hold
    }
}

/// The recommendation plus everything needed to audit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub decision: TradingDecision,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub probabilities: Probabilities,
    pub explanations: Vec<String>,
    pub warnings: Vec<String>,
    /// Rule that produced the base decision.
    pub rule: RuleId,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

// =============================================================================
// Engine
// =============================================================================

pub struct DecisionEngine;

impl DecisionEngine {
    pub fn decide(ta: &TechnicalAnalysis, config: &AnalysisConfig) -> Decision {
        Self::decide_at(ta, config, Utc::now())
    }

    /// Same as [`DecisionEngine::decide`] with an explicit clock.
    pub fn decide_at(ta: &TechnicalAnalysis, config: &AnalysisConfig, now: DateTime<Utc>) -> Decision {
        let mut explanations = Vec::new();
        let mut warnings = Vec::new();

        // ── 1. Rule table ────────────────────────────────────────────────
        let rule = rules::evaluate(ta);
        let mut decision = rule.decision;
        let confidence = rule.confidence.clamp(0.0, 1.0);
        explanations.push(rule.explain(ta));
        debug!(rule = ?rule.id, candidate = %decision, confidence, "rule fired");

        // ── 2. Confidence floor ──────────────────────────────────────────
        if confidence < config.confidence_floor {
            if decision != TradingDecision::Hold {
                info!(
                    candidate = %decision,
                    confidence,
                    floor = config.confidence_floor,
                    "confidence below floor, forcing HOLD"
                );
            }
            decision = TradingDecision::Hold;
            warnings.push(format!(
                "Low confidence ({:.0}% < {:.0}% floor): forcing HOLD for capital protection",
                confidence * 100.0,
                config.confidence_floor * 100.0
            ));
        }

        // ── 3. Context ───────────────────────────────────────────────────
        annotate_context(ta, config, &mut explanations, &mut warnings);

        // ── 4. Probabilities ─────────────────────────────────────────────
        let probabilities = distribute(decision, confidence, ta.rsi.value);

        Decision {
            decision,
            confidence,
            probabilities,
            explanations,
            warnings,
            rule: rule.id,
            timestamp: now.to_rfc3339(),
        }
    }
}

fn annotate_context(
    ta: &TechnicalAnalysis,
    config: &AnalysisConfig,
    explanations: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let periods = ta.ema.as_ref().map(|ema| ema.periods);
    match (ta.trend, periods) {
        (MarketTrend::Bullish, Some([fast, medium, slow])) => explanations.push(format!(
            "Price above EMA{fast}, EMA{medium} and EMA{slow}: bullish trend"
        )),
        (MarketTrend::Bearish, Some([fast, medium, slow])) => explanations.push(format!(
            "Price below EMA{fast}, EMA{medium} and EMA{slow}: bearish trend"
        )),
        (MarketTrend::HighVolatility, _) => warnings.push(format!(
            "High volatility: Bollinger bandwidth {:.2}% exceeds the {:.2}% threshold",
            ta.bollinger_bands.as_ref().map_or(0.0, |b| b.bandwidth) * 100.0,
            config.volatility_threshold * 100.0
        )),
        (_, Some(_)) => explanations.push("Mixed EMA alignment: lateral market".to_string()),
        (_, None) => {
            explanations.push("EMA alignment not evaluated: trend treated as lateral".to_string())
        }
    }

    if let Some(volume) = &ta.volume_analysis {
        match volume.interpretation {
            Interpretation::Bullish => explanations.push(format!(
                "{} confirms participation",
                volume.description.as_deref().unwrap_or("Volume above average")
            )),
            Interpretation::Bearish => warnings.push(format!(
                "Weak participation: {}",
                volume.description.as_deref().unwrap_or("volume below average")
            )),
            Interpretation::Neutral => {}
        }
    }

    match ta.bollinger_bands.as_ref().map(|b| b.price_position) {
        Some(PricePosition::AboveUpper) => {
            warnings.push("Price above the upper Bollinger band: move is stretched".to_string())
        }
        Some(PricePosition::BelowLower) => {
            warnings.push("Price below the lower Bollinger band: move is stretched".to_string())
        }
        _ => {}
    }

    if let Some(fib) = ta.fibonacci.as_ref().filter(|f| f.distance_to_nearest < FIB_PROXIMITY) {
        warnings.push(format!("Price is testing the Fibonacci {} level", fib.nearest_level));
    }
}

/// Probability distribution for a final `decision` held with `confidence`.
///
/// The decision's own outcome receives exactly `confidence`.  The remaining
/// `1 - confidence` is split between the other two outcomes in proportion to
/// fixed pressure weights derived from RSI:
///
///   buy  = (100 - RSI) / 100
///   sell = RSI / 100
///   hold = 0.5
///
/// The hold weight is always positive, so each split has a non-zero
/// denominator.
pub fn distribute(decision: TradingDecision, confidence: f64, rsi: f64) -> Probabilities {
    let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
    let rsi = if rsi.is_nan() { 50.0 } else { rsi.clamp(0.0, 100.0) };
    let remainder = 1.0 - confidence;

    let buy_pressure = (100.0 - rsi) / 100.0;
    let sell_pressure = rsi / 100.0;

    // (first other, second other) with the second taking the exact leftover.
    let split = |w_a: f64, w_b: f64| {
        let a = remainder * w_a / (w_a + w_b);
        (a, remainder - a)
    };

    match decision {
        TradingDecision::Buy => {
            let (sell, hold) = split(sell_pressure, HOLD_PRESSURE);
            Probabilities { buy: confidence, sell, hold }
        }
        TradingDecision::Sell => {
            let (buy, hold) = split(buy_pressure, HOLD_PRESSURE);
            Probabilities { buy, sell: confidence, hold }
        }
        TradingDecision::Hold => {
            let (buy, sell) = split(buy_pressure, sell_pressure);
            Probabilities { buy, sell, hold: confidence }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::test_support::analysis;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn floor_warnings(d: &Decision) -> usize {
        d.warnings.iter().filter(|w| w.contains("capital protection")).count()
    }

    #[test]
    fn oversold_reversal_buys_without_floor_warning() {
        let ta = analysis(25.0, 1.10, [1.09, 1.12, 1.15]);
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        assert_eq!(d.decision, TradingDecision::Buy);
        assert_eq!(d.confidence, 0.75);
        assert_eq!(d.rule, RuleId::OversoldReversal);
        assert!(d.explanations[0].contains("oversold"));
        assert_eq!(floor_warnings(&d), 0);
        assert_eq!(d.probabilities.buy, 0.75);
        assert_eq!(d.timestamp, "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn overbought_reversal_sells() {
        let ta = analysis(78.0, 1.10, [1.09, 1.12, 1.15]);
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        assert_eq!(d.decision, TradingDecision::Sell);
        assert_eq!(d.confidence, 0.75);
        assert!(d.explanations[0].contains("overbought"));
        assert_eq!(d.probabilities.sell, 0.75);
    }

    #[test]
    fn neutral_is_held_with_capital_protection_warning() {
        let ta = analysis(50.0, 1.10, [1.09, 1.12, 1.15]);
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        assert_eq!(d.decision, TradingDecision::Hold);
        assert_eq!(d.confidence, 0.5);
        assert_eq!(floor_warnings(&d), 1);
        assert_eq!(d.warnings[0], "Low confidence (50% < 60% floor): forcing HOLD for capital protection");
        assert_eq!(d.probabilities.hold, 0.5);
    }

    #[test]
    fn floor_override_keeps_confidence_and_forces_hold() {
        let config = AnalysisConfig {
            confidence_floor: 0.8,
            ..AnalysisConfig::default()
        };
        let ta = analysis(25.0, 1.10, [1.09, 1.12, 1.15]);
        let d = DecisionEngine::decide_at(&ta, &config, fixed_now());
        assert_eq!(d.rule, RuleId::OversoldReversal);
        assert_eq!(d.decision, TradingDecision::Hold);
        assert_eq!(d.confidence, 0.75);
        assert_eq!(floor_warnings(&d), 1);
        // The rule explanation survives the override.
        assert!(d.explanations[0].contains("oversold"));
    }

    #[test]
    fn below_floor_is_always_hold() {
        for floor in [0.55, 0.6, 0.76, 0.9, 1.0] {
            let config = AnalysisConfig {
                confidence_floor: floor,
                ..AnalysisConfig::default()
            };
            for rsi in [10.0, 25.0, 50.0, 75.0, 95.0] {
                for price in [1.0, 1.10, 1.13, 1.2] {
                    let ta = analysis(rsi, price, [1.09, 1.12, 1.15]);
                    let d = DecisionEngine::decide_at(&ta, &config, fixed_now());
                    if d.confidence < floor {
                        assert_eq!(d.decision, TradingDecision::Hold);
                        assert_eq!(floor_warnings(&d), 1);
                    } else {
                        assert_eq!(floor_warnings(&d), 0);
                    }
                }
            }
        }
    }

    #[test]
    fn context_annotations_follow_rule_output() {
        // Price above every EMA: bullish trend explanation comes second.
        let ta = analysis(25.0, 1.20, [1.09, 1.12, 1.15]);
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        assert_eq!(d.explanations.len(), 2);
        assert!(d.explanations[1].contains("bullish trend"));
    }

    #[test]
    fn missing_indicators_skip_their_annotations() {
        let mut ta = analysis(50.0, 1.10, [1.09, 1.12, 1.15]);
        ta.ema = None;
        ta.bollinger_bands = None;
        ta.fibonacci = None;
        ta.volume_analysis = None;
        ta.trend = MarketTrend::Lateral;
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        assert_eq!(d.decision, TradingDecision::Hold);
        assert_eq!(d.explanations.len(), 2);
        assert!(d.explanations[1].contains("not evaluated"));
        assert_eq!(d.warnings.len(), 1, "only the floor warning: {:?}", d.warnings);
    }

    #[test]
    fn high_volatility_is_a_warning() {
        let mut ta = analysis(50.0, 1.10, [1.09, 1.12, 1.15]);
        ta.trend = MarketTrend::HighVolatility;
        ta.bollinger_bands.as_mut().unwrap().bandwidth = 0.08;
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        assert!(d.warnings.iter().any(|w| w.starts_with("High volatility")));
        // Floor warning fired first.
        assert!(d.warnings[0].contains("capital protection"));
    }

    #[test]
    fn probabilities_sum_to_one_for_every_confidence() {
        for decision in [TradingDecision::Buy, TradingDecision::Sell, TradingDecision::Hold] {
            for step in 0..=1000 {
                let confidence = step as f64 / 1000.0;
                for rsi in [0.0, 12.5, 30.0, 50.0, 70.0, 99.9, 100.0] {
                    let p = distribute(decision, confidence, rsi);
                    assert!((p.sum() - 1.0).abs() < 1e-9, "{decision} c={confidence} rsi={rsi}: {p:?}");
                    assert!(p.buy >= 0.0 && p.sell >= 0.0 && p.hold >= 0.0);
                }
            }
        }
    }

    #[test]
    fn decision_owns_confidence_mass() {
        let p = distribute(TradingDecision::Hold, 0.5, 50.0);
        assert_eq!(p.hold, 0.5);
        assert!((p.buy - 0.25).abs() < 1e-12);
        assert!((p.sell - 0.25).abs() < 1e-12);

        // Oversold RSI leans the leftover of a HOLD towards BUY.
        let p = distribute(TradingDecision::Hold, 0.5, 20.0);
        assert!(p.buy > p.sell);

        // BUY at RSI 25: sell weight 0.25, hold weight 0.5.
        let p = distribute(TradingDecision::Buy, 0.75, 25.0);
        assert!((p.sell - 0.25 / 3.0).abs() < 1e-12);
        assert!((p.hold - 0.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn decision_serialises_with_stable_field_names() {
        let ta = analysis(25.0, 1.10, [1.09, 1.12, 1.15]);
        let d = DecisionEngine::decide_at(&ta, &AnalysisConfig::default(), fixed_now());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["decision"], "BUY");
        assert_eq!(json["confidence"], 0.75);
        assert_eq!(json["probabilities"]["buy"], 0.75);
        assert!(json["explanations"].is_array());
        assert!(json["warnings"].is_array());
        assert_eq!(json["rule"], "OVERSOLD_REVERSAL");
    }
}
