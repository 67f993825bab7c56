//! Validation Error Types

use thiserror::Error;

/// Errors during input validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value is not a JSON number
    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    /// Value has the wrong shape
    #[error("{field} has an invalid format: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },

    /// NaN or infinite value
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    /// Ranked predictions are not sorted by descending confidence
    #[error("Prediction {index} has higher confidence than the one ranked above it")]
    UnorderedRanking { index: usize },
}
