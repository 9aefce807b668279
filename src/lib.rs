// =============================================================================
// SUSE Engine: candle window in, BUY / SELL / HOLD out
// =============================================================================
//
// Layers, bottom-up:
//   market_data  normalize raw OHLCV input
//   indicators   RSI, EMA, ATR, Bollinger, VWAP, Fibonacci, relative volume
//   synthesis    qualitative states + TechnicalAnalysis
//   decision     ordered rules, confidence floor, probabilities
//   analysis     the end-to-end pipeline and its result package
//   api          axum REST surface over `analysis`
// =============================================================================

pub mod analysis;
pub mod api;
pub mod app_state;
pub mod config;
pub mod decision;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod synthesis;
pub mod types;

pub use analysis::{analyze, AnalysisRequest, AnalysisResult};
pub use config::AnalysisConfig;
pub use error::AnalysisError;
