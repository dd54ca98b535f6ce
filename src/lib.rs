//! # Sales Oracle
//!
//! Umbrella crate for the sales forecasting workspace.
//!
//! - [`sales_math`]: regression, moments, percentiles and autocorrelation
//! - [`sales_forecast`]: aggregation, features, the tiered forecast pipeline,
//!   accuracy tracking and alerts
//!
//! ## Example
//!
//! ```
//! use sales_oracle_workspace::math::descriptive::mean;
//!
//! assert_eq!(mean(&[10.0, 20.0, 30.0]), 20.0);
//! assert!(sales_oracle_workspace::forecast::VERSION.starts_with("0."));
//! ```

pub use sales_forecast as forecast;
pub use sales_math as math;
