// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the analysis
// pipeline consumes.  The candle-level entry points return
// `Result<_, AnalysisError>` so that a look-back longer than the series is a
// labeled `InsufficientData` failure instead of a silent default.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod fibonacci;
pub mod rsi;
pub mod smoothing;
pub mod volume;
pub mod vwap;

pub use atr::calculate_atr;
pub use bollinger::{bollinger, BollingerResult};
pub use ema::ema;
pub use fibonacci::{calculate_fibonacci, FibonacciResult};
pub use rsi::{rsi, rsi_series};
pub use volume::calculate_relative_volume;
pub use vwap::calculate_vwap;
