//! Seasonality detection on detrended sales

use sales_math::{detect_cycle, LinearFit};
use serde::{Deserialize, Serialize};

/// Trend and cycle summary reported with every forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalComponents {
    /// Slope divided by mean sales: relative daily drift
    pub trend: f64,
    /// 0 = no detectable cycle, 1 = strongly periodic
    pub seasonal_strength: f64,
    pub cycle_length_days: usize,
}

/// Outcome of cycle detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalityProfile {
    /// Cycle used for modelling
    pub cycle_length: usize,
    /// Strength of that cycle, 0 when none was found
    pub strength: f64,
    /// Whether autocorrelation found the cycle or the default was used
    pub detected: bool,
}

/// Detect the dominant cycle of `values` after removing the OLS trend
///
/// Candidate lags run from 2 to `min(max_cycle, n / 4)`; the best lag must
/// exceed `min_correlation` or the `default_cycle` is reported with strength 0.
pub fn detect_seasonality(
    values: &[f64],
    default_cycle: usize,
    max_cycle: usize,
    min_correlation: f64,
) -> SeasonalityProfile {
    let fallback = SeasonalityProfile {
        cycle_length: default_cycle,
        strength: 0.0,
        detected: false,
    };

    let residuals = match LinearFit::fit(values) {
        Ok(fit) => fit.residuals(values),
        Err(_) => return fallback,
    };

    let max_lag = max_cycle.min(values.len() / 4);
    match detect_cycle(&residuals, max_lag, min_correlation) {
        Some(cycle) => SeasonalityProfile {
            cycle_length: cycle.length,
            strength: cycle.correlation.clamp(0.0, 1.0),
            detected: true,
        },
        None => fallback,
    }
}

/// Slope normalised by the mean, 0 when the mean is 0
pub fn normalized_trend(slope: f64, mean: f64) -> f64 {
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }
    sales_math::finite_or(slope / mean, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_cycle_on_top_of_trend() {
        let pattern = [0.0, 2.0, 1.0, 3.0, 10.0, 20.0, 15.0];
        let values: Vec<f64> = (0..56)
            .map(|i| 100.0 + 1.5 * i as f64 + pattern[i % 7])
            .collect();
        let profile = detect_seasonality(&values, 7, 14, 0.3);

        assert!(profile.detected);
        assert_eq!(profile.cycle_length, 7);
        assert!(profile.strength > 0.5);
    }

    #[test]
    fn test_linear_series_uses_default() {
        let values: Vec<f64> = (0..30).map(|i| 10.0 + i as f64).collect();
        let profile = detect_seasonality(&values, 7, 14, 0.3);

        assert!(!profile.detected);
        assert_eq!(profile.cycle_length, 7);
        assert_eq!(profile.strength, 0.0);
    }

    #[test]
    fn test_normalized_trend_zero_mean() {
        assert_eq!(normalized_trend(3.0, 0.0), 0.0);
        assert_eq!(normalized_trend(5.0, 100.0), 0.05);
    }
}
