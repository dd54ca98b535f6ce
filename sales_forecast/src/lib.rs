//! # Sales Forecast
//!
//! A Rust library for forecasting daily sales from raw transaction records.
//!
//! ## Features
//!
//! - Daily, weekly, monthly and seasonal aggregation of sales records
//! - Series features: OLS trend, volatility, moments and percentiles
//! - Forecasting models (Holt-Winters exponential smoothing, autoregressive)
//!   combined into a backtest-weighted ensemble with confidence intervals
//! - Tiered fallbacks: augmented ensemble, statistical ensemble, naive average
//! - Accuracy tracking of issued forecasts and threshold alerts
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use sales_forecast::{ForecastConfig, ForecastController, ForecastRequest, RawSaleRecord};
//!
//! # fn main() -> Result<(), sales_forecast::ForecastError> {
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
//! let records: Vec<RawSaleRecord> = (0..42)
//!     .map(|day| RawSaleRecord::new(start + Duration::days(day), 100.0 + (day % 7) as f64 * 10.0))
//!     .collect();
//!
//! let controller = ForecastController::new(ForecastConfig::default())?;
//! let outcome = controller.forecast_statistical(&ForecastRequest::new("store-1", records).with_days(7))?;
//!
//! assert_eq!(outcome.result.forecasts.len(), 7);
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod alerts;
pub mod augment;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod controller;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod result;
pub mod seasonality;
pub mod store;
pub mod telemetry;
pub mod tracker;
pub mod utils;

// Re-export commonly used types
pub use crate::aggregate::{Aggregator, LookbackWindow, SalesSummary};
pub use crate::alerts::{active_alerts, Alert, AlertGenerator, AlertType, Severity};
pub use crate::augment::{AugmentationRequest, FeatureSummary, ForecastAugmenter};
pub use crate::cache::{AnalysisCache, CacheKey, InMemoryAnalysisCache, SalesAnalysis};
pub use crate::config::{AlertPolicy, ForecastConfig, SmoothingParams};
pub use crate::controller::{ForecastController, ForecastOutcome, ForecastRequest};
pub use crate::data::{DailySeriesPoint, DataLoader, RawSaleRecord, SaleItem};
pub use crate::ensemble::{EnsembleForecast, EnsembleForecaster, ModelWeight};
pub use crate::error::{AugmentationError, ForecastError};
pub use crate::features::{FeatureExtractor, SeriesFeatures, TrendDirection};
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::{ForecastModel, TrainedForecastModel};
pub use crate::result::{
    ConfidenceInterval, ForecastPoint, ForecastResult, ForecastResultBuilder, ForecastTier,
};
pub use crate::seasonality::SeasonalComponents;
pub use crate::store::{ForecastStore, InMemoryStore};
pub use crate::tracker::{AccuracyRecord, AccuracyTracker, Evaluation, SweepReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
