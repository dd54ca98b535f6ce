use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use rstest::rstest;
use sales_forecast::features::TrendDirection;
use sales_forecast::{DailySeriesPoint, FeatureExtractor, ForecastError};
use sales_math::descriptive::{median, mode, percentile};

fn series(values: &[f64]) -> Vec<DailySeriesPoint> {
    // 2024-03-03 is a Sunday
    let start = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| DailySeriesPoint::new(start + Duration::days(i as i64), *v, 1))
        .collect()
}

#[test]
fn test_constant_series_has_no_spread() {
    let daily = series(&[100.0; 14]);
    let features = FeatureExtractor::default().extract(&daily).unwrap();

    assert_eq!(features.volatility, 0.0);
    assert_eq!(features.moments.skewness, 0.0);
    assert_eq!(features.moments.kurtosis, 0.0);
    assert_eq!(features.moments.std_dev, 0.0);
    assert_eq!(features.trend_direction, TrendDirection::Stable);
    assert_eq!(features.percentiles.p25, 100.0);
    assert_eq!(features.percentiles.p95, 100.0);
}

#[test]
fn test_too_few_days() {
    let err = FeatureExtractor::default()
        .extract(&series(&[1.0, 2.0, 3.0]))
        .unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientData {
            found: 3,
            required: 7
        }
    ));
}

#[test]
fn test_median_percentile_agreement() {
    let odd = [5.0, 1.0, 9.0, 3.0, 7.0];
    let even = [4.0, 1.0, 3.0, 2.0];
    assert_eq!(percentile(&odd, 50.0).unwrap(), median(&odd));
    assert_eq!(percentile(&even, 50.0).unwrap(), median(&even));
    assert_relative_eq!(median(&even), 2.5);
}

#[test]
fn test_mode_tie_goes_to_first_seen() {
    assert_eq!(mode(&[3.0, 1.0, 1.0, 3.0, 2.0]), 3.0);
    assert_eq!(mode(&[2.2, 1.9, 5.0]), 2.0);
}

#[test]
fn test_weekly_pattern_and_ranking() {
    // Two weeks, Saturdays strongest and Sundays weakest
    let week = [10.0, 40.0, 40.0, 50.0, 60.0, 80.0, 90.0];
    let values: Vec<f64> = week.iter().chain(week.iter()).copied().collect();
    let features = FeatureExtractor::default().extract(&series(&values)).unwrap();

    assert_eq!(features.weekly_pattern, week);
    let ranked = features.ranked_weekdays();
    assert_eq!(ranked[0], 6);
    assert_eq!(ranked[6], 0);
    assert_eq!(features.observations, 14);
    assert_eq!(features.monthly_trend.len(), 1);
    assert_relative_eq!(features.seasonal_buckets[1], values.iter().sum::<f64>());
}

#[rstest]
#[case(2.0, TrendDirection::Upward)]
#[case(-2.0, TrendDirection::Downward)]
#[case(0.5, TrendDirection::Stable)]
fn test_trend_classification(#[case] step: f64, #[case] expected: TrendDirection) {
    let values: Vec<f64> = (0..10).map(|i| 200.0 + step * i as f64).collect();
    let features = FeatureExtractor::default().extract(&series(&values)).unwrap();

    assert_relative_eq!(features.slope(), step, epsilon = 1e-9);
    assert_eq!(features.trend_direction, expected);
}

#[test]
fn test_custom_threshold() {
    let values: Vec<f64> = (0..10).map(|i| 200.0 + 0.5 * i as f64).collect();
    let features = FeatureExtractor::new(0.1, 7)
        .extract(&series(&values))
        .unwrap();
    assert_eq!(features.trend_direction, TrendDirection::Upward);
}
