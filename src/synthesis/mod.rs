// =============================================================================
// Indicator Synthesizer
// =============================================================================
//
// Combines raw indicator outputs into the qualitative states (zone, slope,
// trend, price position, interpretation) the decision rules evaluate.

pub mod states;
pub mod technical;

pub use technical::{
    BollingerBandsData, EmaData, FibonacciLevels, IndicatorValue, PriceRelation, RawIndicators, RsiData,
    TechnicalAnalysis,
};
