// =============================================================================
// Decision Module
// =============================================================================
//
// - Ordered rule table (first match wins)
// - Decision engine: confidence floor, context annotations, probabilities

pub mod engine;
pub mod rules;

pub use engine::{distribute, Decision, DecisionEngine, Probabilities};
pub use rules::{Rule, RuleId, RULES};
