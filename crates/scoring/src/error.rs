//! Error types for CRPS evaluation.
//!
//! Only malformed inputs are errors. Arbitrage violations and insufficient
//! data are handled as data elsewhere and never surface here.

use thiserror::Error;

/// Errors that can occur when scoring a forecast distribution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Fewer points than needed to define a distribution.
    #[error("too few points: got {got}, need at least {min}")]
    TooFewPoints {
        /// Points supplied.
        got: usize,
        /// Minimum required.
        min: usize,
    },

    /// Strike and probability arrays differ in length.
    #[error("length mismatch: {strikes} strikes vs {values} probabilities")]
    LengthMismatch {
        /// Number of strikes.
        strikes: usize,
        /// Number of probabilities.
        values: usize,
    },

    /// The historical benchmark was given no sample.
    #[error("historical sample is empty")]
    EmptyHistory,

    /// An input contained NaN or an infinity.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    /// Strikes were not in ascending order.
    #[error("strikes not ascending at index {index}")]
    UnsortedStrikes {
        /// First index where `strikes[index] < strikes[index - 1]`.
        index: usize,
    },

    /// A tail extension or integration margin was negative or non-finite.
    #[error("invalid {name}: {value}")]
    InvalidMargin {
        /// Which parameter.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Benchmark bounds with `upper < lower`.
    #[error("invalid bounds: lower {lower} > upper {upper}")]
    InvalidBounds {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },
}

impl ScoringError {
    /// Creates a too-few-points error.
    pub fn too_few_points(got: usize, min: usize) -> Self {
        Self::TooFewPoints { got, min }
    }

    /// Creates a length mismatch error.
    pub fn length_mismatch(strikes: usize, values: usize) -> Self {
        Self::LengthMismatch { strikes, values }
    }

    /// Creates an invalid margin error.
    pub fn invalid_margin(name: &'static str, value: f64) -> Self {
        Self::InvalidMargin { name, value }
    }

    /// Returns true for errors caused by the shape of array inputs.
    #[must_use]
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::TooFewPoints { .. } | Self::LengthMismatch { .. } | Self::EmptyHistory
        )
    }
}

/// Result type for scoring operations.
pub type Result<T> = std::result::Result<T, ScoringError>;
