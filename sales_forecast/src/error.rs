//! Error types for the sales_forecast crate

use sales_math::MathError;
use thiserror::Error;

/// Failure modes of an augmentation call
///
/// The controller treats every variant the same way: the augmented result is
/// discarded and the statistical result is used instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AugmentationError {
    #[error("augmentation service unavailable: {0}")]
    Unavailable(String),

    #[error("augmentation timed out after {0} ms")]
    Timeout(u64),

    #[error("augmentation quota exhausted: {0}")]
    Quota(String),

    #[error("malformed augmentation response: {0}")]
    Malformed(String),
}

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No sales records fell inside the requested window
    #[error("No data: {0}")]
    NoData(String),

    /// Too few distinct days of sales to model
    #[error("Insufficient data: found {found} distinct days, need at least {required}")]
    InsufficientData { found: usize, required: usize },

    /// A raw record violated the input contract
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A statistical model could not be fitted
    #[error("Model error: {0}")]
    Model(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// The optional augmentation step failed
    #[error("Augmentation error: {0}")]
    Augmentation(#[from] AugmentationError),

    /// A tier produced a result that failed the canonical shape check
    #[error("Structural validation failed: {0}")]
    StructuralValidation(String),

    /// A best-effort write to the store failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a scalar field such as a date
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ForecastError {
    /// Errors the caller must see immediately, before any model runs
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ForecastError::NoData(_)
                | ForecastError::InsufficientData { .. }
                | ForecastError::InvalidRecord(_)
                | ForecastError::InvalidParameter(_)
        )
    }

    /// Errors raised while fitting or running a model; they trigger the naive tier
    pub fn is_model_error(&self) -> bool {
        matches!(self, ForecastError::Model(_) | ForecastError::Math(_))
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
