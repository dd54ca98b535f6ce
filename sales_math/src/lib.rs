//! # Sales Math
//!
//! Numeric building blocks for sales time series.
//! This crate provides the closed-form statistics the forecasting pipeline
//! relies on: least-squares trend fitting, descriptive moments,
//! interpolated percentiles and autocorrelation.
//!
//! Every function resolves numeric degeneracies (zero variance, zero mean,
//! constant series) to a defined neutral value instead of NaN or infinity.

use thiserror::Error;

pub mod autocorrelation;
pub mod descriptive;
pub mod regression;

pub use autocorrelation::{autocorrelation, autocovariances, detect_cycle, CycleEstimate};
pub use descriptive::{Moments, Percentiles};
pub use regression::LinearFit;

/// Errors that can occur in statistical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for statistical operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Returns `value` when it is finite, otherwise `fallback`.
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_or_replaces_non_finite() {
        assert_eq!(finite_or(f64::NAN, 0.0), 0.0);
        assert_eq!(finite_or(f64::INFINITY, 1.0), 1.0);
        assert_eq!(finite_or(2.5, 0.0), 2.5);
    }
}
