// =============================================================================
// Decision Rules: ordered predicate → outcome table
// =============================================================================
//
// Evaluated top-to-bottom; first match governs the base decision:
//
//   1. OVERSOLD_REVERSAL  : RSI oversold AND close > fast EMA   => BUY  0.75
//   2. OVERBOUGHT_REVERSAL: RSI overbought AND close < mid EMA  => SELL 0.75
//   3. NEUTRAL            : always                             => HOLD 0.50
//
// With the EMA family disabled neither reversal can be confirmed.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::synthesis::TechnicalAnalysis;
use crate::types::{RsiZone, TradingDecision};

pub const REVERSAL_CONFIDENCE: f64 = 0.75;
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    OversoldReversal,
    OverboughtReversal,
    Neutral,
}

/// One entry of the rule table.
pub struct Rule {
    pub id: RuleId,
    pub decision: TradingDecision,
    pub confidence: f64,
    predicate: fn(&TechnicalAnalysis) -> bool,
    explanation: fn(&TechnicalAnalysis) -> String,
}

impl Rule {
    pub fn matches(&self, ta: &TechnicalAnalysis) -> bool {
        (self.predicate)(ta)
    }

    pub fn explain(&self, ta: &TechnicalAnalysis) -> String {
        (self.explanation)(ta)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("decision", &self.decision)
            .field("confidence", &self.confidence)
            .finish()
    }
}

/// The rule table in priority order.
pub static RULES: [Rule; 3] = [
    Rule {
        id: RuleId::OversoldReversal,
        decision: TradingDecision::Buy,
        confidence: REVERSAL_CONFIDENCE,
        predicate: oversold_reversal,
        explanation: explain_oversold_reversal,
    },
    Rule {
        id: RuleId::OverboughtReversal,
        decision: TradingDecision::Sell,
        confidence: REVERSAL_CONFIDENCE,
        predicate: overbought_reversal,
        explanation: explain_overbought_reversal,
    },
    Rule {
        id: RuleId::Neutral,
        decision: TradingDecision::Hold,
        confidence: NEUTRAL_CONFIDENCE,
        predicate: always,
        explanation: explain_neutral,
    },
];

/// First rule whose predicate holds.  The last rule always matches.
pub fn evaluate(ta: &TechnicalAnalysis) -> &'static Rule {
    let last = &RULES[RULES.len() - 1];
    RULES.iter().find(|rule| rule.matches(ta)).unwrap_or(last)
}

// =============================================================================
// Predicates
// =============================================================================

fn oversold_reversal(ta: &TechnicalAnalysis) -> bool {
    ta.rsi.zone == RsiZone::Oversold && ta.ema.as_ref().is_some_and(|ema| ta.price > ema.ema20)
}

fn overbought_reversal(ta: &TechnicalAnalysis) -> bool {
    ta.rsi.zone == RsiZone::Overbought && ta.ema.as_ref().is_some_and(|ema| ta.price < ema.ema50)
}

fn always(_: &TechnicalAnalysis) -> bool {
    true
}

// =============================================================================
// Explanations
// =============================================================================

fn ema_label(ta: &TechnicalAnalysis, slot: usize) -> String {
    ta.ema
        .as_ref()
        .map_or_else(|| "EMA".to_string(), |ema| format!("EMA{}", ema.periods[slot]))
}

fn explain_oversold_reversal(ta: &TechnicalAnalysis) -> String {
    format!(
        "RSI at {:.1} signals oversold conditions; price above {} suggests a bullish reversal",
        ta.rsi.value,
        ema_label(ta, 0)
    )
}

fn explain_overbought_reversal(ta: &TechnicalAnalysis) -> String {
    format!(
        "RSI at {:.1} signals overbought conditions; price below {} suggests a bearish reversal",
        ta.rsi.value,
        ema_label(ta, 1)
    )
}

fn explain_neutral(ta: &TechnicalAnalysis) -> String {
    format!(
        "Neutral or uncertain conditions (RSI {:.1}, {}); conservative HOLD recommended",
        ta.rsi.value, ta.rsi.zone
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::test_support::analysis;

    #[test]
    fn table_order_is_buy_sell_hold() {
        let ids: Vec<RuleId> = RULES.iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec![RuleId::OversoldReversal, RuleId::OverboughtReversal, RuleId::Neutral]
        );
    }

    #[test]
    fn oversold_reversal_requires_price_above_fast_ema() {
        let rule = &RULES[0];
        assert!(rule.matches(&analysis(25.0, 1.10, [1.09, 1.12, 1.15])));
        assert!(!rule.matches(&analysis(25.0, 1.08, [1.09, 1.12, 1.15])));
        assert!(!rule.matches(&analysis(35.0, 1.10, [1.09, 1.12, 1.15])));
    }

    #[test]
    fn overbought_reversal_requires_price_below_medium_ema() {
        let rule = &RULES[1];
        assert!(rule.matches(&analysis(75.0, 1.10, [1.09, 1.12, 1.15])));
        assert!(!rule.matches(&analysis(75.0, 1.13, [1.09, 1.12, 1.15])));
        assert!(!rule.matches(&analysis(65.0, 1.10, [1.09, 1.12, 1.15])));
    }

    #[test]
    fn neutral_always_matches() {
        assert!(RULES[2].matches(&analysis(50.0, 1.0, [1.0, 1.0, 1.0])));
    }

    #[test]
    fn evaluate_picks_first_match() {
        assert_eq!(evaluate(&analysis(20.0, 1.10, [1.0, 1.2, 1.3])).id, RuleId::OversoldReversal);
        assert_eq!(evaluate(&analysis(80.0, 1.10, [1.0, 1.2, 1.3])).id, RuleId::OverboughtReversal);
        assert_eq!(evaluate(&analysis(20.0, 0.90, [1.0, 1.2, 1.3])).id, RuleId::Neutral);
        assert_eq!(evaluate(&analysis(80.0, 1.25, [1.0, 1.2, 1.3])).id, RuleId::Neutral);
    }

    #[test]
    fn reversals_need_the_ema_family() {
        let mut oversold = analysis(20.0, 1.10, [1.0, 1.2, 1.3]);
        oversold.ema = None;
        assert_eq!(evaluate(&oversold).id, RuleId::Neutral);

        let mut overbought = analysis(80.0, 1.10, [1.0, 1.2, 1.3]);
        overbought.ema = None;
        assert_eq!(evaluate(&overbought).id, RuleId::Neutral);
        assert!(RULES[1].explain(&overbought).contains("below EMA suggests"));
    }

    #[test]
    fn explanations_cite_the_reason() {
        let ta = analysis(25.0, 1.10, [1.09, 1.12, 1.15]);
        assert!(RULES[0].explain(&ta).contains("oversold"));
        assert!(RULES[1].explain(&ta).contains("overbought"));
        assert!(RULES[2].explain(&ta).contains("HOLD"));
    }
}
