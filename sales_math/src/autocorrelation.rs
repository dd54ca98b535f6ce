//! Autocorrelation and cycle detection

use serde::{Deserialize, Serialize};

/// Biased autocovariances for lags `0..=max_lag`
///
/// Uses the `1/n` normalisation so the resulting sequence is positive
/// semi-definite, which Yule-Walker estimation depends on.
pub fn autocovariances(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return vec![0.0; max_lag + 1];
    }
    let mean = crate::descriptive::mean(values);

    (0..=max_lag)
        .map(|lag| {
            if lag >= n {
                return 0.0;
            }
            values
                .iter()
                .take(n - lag)
                .zip(values.iter().skip(lag))
                .map(|(a, b)| (a - mean) * (b - mean))
                .sum::<f64>()
                / n as f64
        })
        .collect()
}

/// Autocorrelation of `values` at `lag`, 0 for a constant series
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let cov = autocovariances(values, lag);
    if cov[0].abs() < 1e-12 {
        return 0.0;
    }
    crate::finite_or(cov[lag] / cov[0], 0.0)
}

/// A detected periodicity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleEstimate {
    /// Period in observations
    pub length: usize,
    /// Autocorrelation at that period
    pub correlation: f64,
}

/// Find the lag in `2..=max_lag` with the strongest autocorrelation above `min_correlation`
pub fn detect_cycle(values: &[f64], max_lag: usize, min_correlation: f64) -> Option<CycleEstimate> {
    let upper = max_lag.min(values.len().saturating_sub(1));
    if upper < 2 {
        return None;
    }

    let cov = autocovariances(values, upper);
    if cov[0].abs() < 1e-12 {
        return None;
    }

    let mut best: Option<CycleEstimate> = None;
    for lag in 2..=upper {
        let correlation = cov[lag] / cov[0];
        if !correlation.is_finite() || correlation <= min_correlation {
            continue;
        }
        if best.map_or(true, |b| correlation > b.correlation) {
            best = Some(CycleEstimate {
                length: lag,
                correlation,
            });
        }
    }

    best
}
