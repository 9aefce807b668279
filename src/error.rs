// =============================================================================
// Analysis Errors
// =============================================================================
//
// Every rejection the pipeline can produce.  Degenerate arithmetic (zero
// average loss, zero volume, zero middle band) is never an error: each
// indicator resolves it to a documented boundary value instead.
// =============================================================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The candle payload is missing, malformed, or shorter than the smallest
    /// window a decision can be made from.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single indicator needs a longer window than the series provides.
    #[error("Insufficient data for {indicator}: requires {required} candles, got {available}")]
    InsufficientData {
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    pub(crate) fn insufficient(indicator: impl Into<String>, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            indicator: indicator.into(),
            required,
            available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_indicator_and_counts() {
        let err = AnalysisError::insufficient("EMA(200)", 200, 15);
        assert_eq!(
            err.to_string(),
            "Insufficient data for EMA(200): requires 200 candles, got 15"
        );
    }

    #[test]
    fn invalid_input_message() {
        let err = AnalysisError::InvalidInput("candles must be an array".into());
        assert_eq!(err.to_string(), "Invalid input: candles must be an array");
    }
}
