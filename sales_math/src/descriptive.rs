//! Descriptive statistics
//!
//! Contains the distributional measures used for sales features:
//! - Mean, median and rounded mode
//! - Sample variance and standard deviation
//! - Skewness and excess kurtosis
//! - Linearly interpolated percentiles

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median; the average of the two middle values for even counts
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Most frequent value after rounding to whole units
///
/// Ties go to the value encountered first.
pub fn mode(values: &[f64]) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    let mut best: Option<(i64, usize)> = None;

    for &value in values {
        let key = value.round() as i64;
        let count = counts.entry(key).or_insert(0);
        *count += 1;
    }

    // Second pass keeps first-encountered order for ties.
    for &value in values {
        let key = value.round() as i64;
        let count = counts[&key];
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((key, count)),
        }
    }

    best.map(|(key, _)| key as f64).unwrap_or(0.0)
}

/// Sample variance (n − 1 denominator), 0 when fewer than two values
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation
pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Population standard deviation (n denominator)
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Coefficient of variation: population standard deviation over the mean
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    crate::finite_or(population_std_dev(values) / m, 0.0)
}

/// Third standardized moment
pub fn skewness(values: &[f64]) -> f64 {
    standardized_moment(values, 3)
}

/// Fourth standardized moment minus 3
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if population_std_dev(values) < 1e-12 {
        return 0.0;
    }
    standardized_moment(values, 4) - 3.0
}

fn standardized_moment(values: &[f64], order: i32) -> f64 {
    let sigma = population_std_dev(values);
    if values.is_empty() || sigma < 1e-12 {
        return 0.0;
    }
    let m = mean(values);
    let moment = values
        .iter()
        .map(|v| ((v - m) / sigma).powi(order))
        .sum::<f64>()
        / values.len() as f64;
    crate::finite_or(moment, 0.0)
}

/// Percentile with linear interpolation between order statistics
///
/// The rank is `(p / 100) * (n - 1)`.
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a percentile of an empty series".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(MathError::InvalidInput(format!(
            "Percentile must be within [0, 100], got {}",
            p
        )));
    }

    let sorted = sorted_copy(values);
    Ok(percentile_of_sorted(&sorted, p))
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Distributional summary of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl Moments {
    /// Compute all moments of `values`
    pub fn of(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot describe an empty series".to_string(),
            ));
        }

        let variance = sample_variance(values);
        Ok(Self {
            mean: mean(values),
            median: median(values),
            mode: mode(values),
            std_dev: variance.sqrt(),
            variance,
            skewness: skewness(values),
            kurtosis: excess_kurtosis(values),
        })
    }
}

/// Quartiles and the 95th percentile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl Percentiles {
    pub fn of(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot compute percentiles of an empty series".to_string(),
            ));
        }
        let sorted = sorted_copy(values);
        Ok(Self {
            p25: percentile_of_sorted(&sorted, 25.0),
            p50: percentile_of_sorted(&sorted, 50.0),
            p75: percentile_of_sorted(&sorted, 75.0),
            p95: percentile_of_sorted(&sorted, 95.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    #[rstest]
    #[case(&[3.0, 1.0, 2.0], 2.0)]
    #[case(&[4.0, 1.0, 3.0, 2.0], 2.5)]
    #[case(&[7.0], 7.0)]
    fn test_median_matches_p50(#[case] values: &[f64], #[case] expected: f64) {
        assert_abs_diff_eq!(median(values), expected);
        assert_abs_diff_eq!(percentile(values, 50.0).unwrap(), expected);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        // rank 0.95 * 4 = 3.8
        assert_abs_diff_eq!(percentile(&values, 95.0).unwrap(), 48.0, epsilon = 1e-9);
        assert_abs_diff_eq!(percentile(&values, 25.0).unwrap(), 20.0);
        assert_abs_diff_eq!(percentile(&values, 0.0).unwrap(), 10.0);
        assert_abs_diff_eq!(percentile(&values, 100.0).unwrap(), 50.0);
    }

    #[test]
    fn test_percentile_rejects_bad_input() {
        assert!(matches!(percentile(&[], 50.0), Err(MathError::InsufficientData(_))));
        assert!(matches!(percentile(&[1.0], 101.0), Err(MathError::InvalidInput(_))));
    }

    #[test]
    fn test_mode_rounds_and_prefers_first() {
        assert_eq!(mode(&[1.2, 2.0, 0.9, 2.4, 3.0]), 1.0);
        assert_eq!(mode(&[5.0, 6.0, 6.0, 5.0]), 5.0);
        assert_eq!(mode(&[]), 0.0);
    }

    #[test]
    fn test_constant_series_moments_are_defined() {
        let moments = Moments::of(&[100.0; 10]).unwrap();
        assert_eq!(moments.variance, 0.0);
        assert_eq!(moments.skewness, 0.0);
        assert_eq!(moments.kurtosis, 0.0);
        assert_eq!(coefficient_of_variation(&[100.0; 10]), 0.0);
    }

    #[test]
    fn test_skewness_sign() {
        let right_tailed = [1.0, 1.0, 1.0, 2.0, 10.0];
        assert!(skewness(&right_tailed) > 0.0);
        let symmetric = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(skewness(&symmetric), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_excess_kurtosis_is_negative() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        assert!(excess_kurtosis(&values) < -1.0);
    }

    #[test]
    fn test_sample_variance() {
        assert_abs_diff_eq!(sample_variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 32.0 / 7.0);
        assert_eq!(sample_variance(&[3.0]), 0.0);
    }

    #[test]
    fn test_coefficient_of_variation_zero_mean() {
        assert_eq!(coefficient_of_variation(&[0.0, 0.0, 0.0]), 0.0);
        assert_abs_diff_eq!(coefficient_of_variation(&[90.0, 110.0]), 0.1, epsilon = 1e-12);
    }
}
