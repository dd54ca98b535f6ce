//! Tunable parameters for the forecasting pipeline
//!
//! Every threshold the pipeline uses lives here. Defaults match the
//! documented behaviour; `from_env` overlays `SALES_FORECAST_*` variables.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

const ENV_PREFIX: &str = "SALES_FORECAST_";

fn env_opt(key: &str) -> Option<String> {
    env::var(format!("{}{}", ENV_PREFIX, key))
        .ok()
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Holt-Winters smoothing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Level smoothing
    pub alpha: f64,
    /// Trend smoothing
    pub beta: f64,
    /// Seasonal smoothing
    pub gamma: f64,
    /// Grid-search the parameters on one-step SSE instead of using them as given
    pub optimize: bool,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            gamma: 0.2,
            optimize: true,
        }
    }
}

/// Thresholds used to derive alerts from a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertPolicy {
    /// Number of trailing history days forming the baseline
    pub baseline_window_days: usize,
    /// Relative drop below baseline that raises a warning
    pub warning_drop: f64,
    /// Relative rise above baseline that raises an opportunity
    pub opportunity_rise: f64,
    /// Relative deviation at which severity becomes medium
    pub medium_deviation: f64,
    /// Relative deviation at which severity becomes high
    pub high_deviation: f64,
    /// Normalized slope magnitude that raises a trend alert
    pub trend_alert_threshold: f64,
    /// Seasonal strength that raises a trend alert
    pub seasonal_alert_threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            baseline_window_days: 7,
            warning_drop: 0.2,
            opportunity_rise: 0.2,
            medium_deviation: 0.25,
            high_deviation: 0.4,
            trend_alert_threshold: 0.05,
            seasonal_alert_threshold: 0.6,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Days forecast when the request does not say
    pub default_forecast_days: usize,
    /// Distinct days of data required before any model runs
    pub min_history_days: usize,
    /// Days of history considered, ending at the request's as-of date
    pub lookback_days: Option<u32>,
    /// Absolute slope separating upward/downward from stable
    pub trend_threshold: f64,
    /// Two-sided coverage of the ensemble confidence intervals
    pub confidence_level: f64,
    /// Weight of series volatility in the interval width
    pub volatility_weight: f64,
    /// Cycle assumed when autocorrelation finds none
    pub default_cycle_length: usize,
    /// Longest cycle autocorrelation may report
    pub max_cycle_length: usize,
    /// Autocorrelation a lag needs to count as a cycle
    pub min_cycle_correlation: f64,
    /// Half-width of the naive interval as a fraction of the average
    pub naive_interval_fraction: f64,
    /// Fixed confidence reported by the naive tier
    pub naive_confidence: f64,
    /// Upper bound on one augmentation call, in milliseconds
    pub augmentation_timeout_ms: u64,
    /// Lifetime of cached analyses, in seconds
    pub cache_ttl_secs: u64,
    pub smoothing: SmoothingParams,
    pub alerts: AlertPolicy,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_forecast_days: 30,
            min_history_days: 7,
            lookback_days: Some(90),
            trend_threshold: 1.0,
            confidence_level: 0.95,
            volatility_weight: 0.25,
            default_cycle_length: 7,
            max_cycle_length: 14,
            min_cycle_correlation: 0.3,
            naive_interval_fraction: 0.2,
            naive_confidence: 0.3,
            augmentation_timeout_ms: 10_000,
            cache_ttl_secs: 300,
            smoothing: SmoothingParams::default(),
            alerts: AlertPolicy::default(),
        }
    }
}

impl ForecastConfig {
    /// Build config from `SALES_FORECAST_*` environment variables over the defaults.
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        let d = Self::default();
        let lookback_days = match env_opt("LOOKBACK_DAYS").as_deref() {
            Some("all") | Some("0") => None,
            Some(v) => v.parse().ok().or(d.lookback_days),
            None => d.lookback_days,
        };

        Self {
            default_forecast_days: env_parse("FORECAST_DAYS", d.default_forecast_days),
            min_history_days: env_parse("MIN_HISTORY_DAYS", d.min_history_days),
            lookback_days,
            trend_threshold: env_parse("TREND_THRESHOLD", d.trend_threshold),
            confidence_level: env_parse("CONFIDENCE_LEVEL", d.confidence_level),
            volatility_weight: env_parse("VOLATILITY_WEIGHT", d.volatility_weight),
            default_cycle_length: env_parse("DEFAULT_CYCLE_LENGTH", d.default_cycle_length),
            max_cycle_length: env_parse("MAX_CYCLE_LENGTH", d.max_cycle_length),
            min_cycle_correlation: env_parse("MIN_CYCLE_CORRELATION", d.min_cycle_correlation),
            naive_interval_fraction: env_parse("NAIVE_INTERVAL_FRACTION", d.naive_interval_fraction),
            naive_confidence: env_parse("NAIVE_CONFIDENCE", d.naive_confidence),
            augmentation_timeout_ms: env_parse("AUGMENTATION_TIMEOUT_MS", d.augmentation_timeout_ms),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", d.cache_ttl_secs),
            smoothing: SmoothingParams {
                alpha: env_parse("ALPHA", d.smoothing.alpha),
                beta: env_parse("BETA", d.smoothing.beta),
                gamma: env_parse("GAMMA", d.smoothing.gamma),
                optimize: env_parse("OPTIMIZE_SMOOTHING", d.smoothing.optimize),
            },
            alerts: d.alerts,
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.default_forecast_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "default_forecast_days must be at least 1".to_string(),
            ));
        }
        if self.min_history_days < 2 {
            return Err(ForecastError::InvalidParameter(
                "min_history_days must be at least 2".to_string(),
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "confidence_level must be between 0 and 1".to_string(),
            ));
        }
        if self.trend_threshold < 0.0 || !self.trend_threshold.is_finite() {
            return Err(ForecastError::InvalidParameter(
                "trend_threshold must be a non-negative number".to_string(),
            ));
        }
        if self.default_cycle_length < 2 || self.max_cycle_length < 2 {
            return Err(ForecastError::InvalidParameter(
                "cycle lengths must be at least 2".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.naive_interval_fraction) {
            return Err(ForecastError::InvalidParameter(
                "naive_interval_fraction must be within [0, 1)".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.naive_confidence) {
            return Err(ForecastError::InvalidParameter(
                "naive_confidence must be within [0, 1]".to_string(),
            ));
        }
        for (name, value) in [
            ("alpha", self.smoothing.alpha),
            ("beta", self.smoothing.beta),
            ("gamma", self.smoothing.gamma),
        ] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn augmentation_timeout(&self) -> Duration {
        Duration::from_millis(self.augmentation_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ForecastConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_forecast_days, 30);
        assert_eq!(config.min_history_days, 7);
        assert_eq!(config.trend_threshold, 1.0);
        assert_eq!(config.naive_confidence, 0.3);
    }

    #[test]
    fn test_validate_rejects_bad_alpha() {
        let mut config = ForecastConfig::default();
        config.smoothing.alpha = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ForecastConfig =
            serde_json::from_str(r#"{"trend_threshold": 2.5, "smoothing": {"alpha": 0.5}}"#).unwrap();
        assert_eq!(config.trend_threshold, 2.5);
        assert_eq!(config.smoothing.alpha, 0.5);
        assert_eq!(config.smoothing.beta, 0.1);
        assert_eq!(config.default_forecast_days, 30);
    }

    #[test]
    fn test_durations() {
        let config = ForecastConfig::default();
        assert_eq!(config.augmentation_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }
}
