pub mod candle;
pub mod normalize;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{closes, Candle, RawCandle, RawTimestamp};
pub use normalize::normalize_candles;
