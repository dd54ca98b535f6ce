use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sales_forecast::error::Result;
use sales_forecast::models::{AutoRegressive, HoltWinters};
use sales_forecast::{
    DailySeriesPoint, EnsembleForecast, EnsembleForecaster, FeatureExtractor, ForecastConfig,
    ForecastError, ForecastModel, SmoothingParams, TrainedForecastModel,
};

const WEEK: [f64; 7] = [-20.0, -5.0, 0.0, 5.0, 10.0, 25.0, -15.0];

fn to_daily(values: &[f64]) -> Vec<DailySeriesPoint> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| DailySeriesPoint::new(start + Duration::days(i as i64), *v, 5))
        .collect()
}

fn noisy(days: usize, pattern: bool, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..days)
        .map(|i| {
            let season = if pattern { WEEK[i % 7] } else { 0.0 };
            200.0 + season + rng.gen_range(-8.0..8.0)
        })
        .collect()
}

fn ensemble_for(values: &[f64], horizon: usize) -> Result<EnsembleForecast> {
    let daily = to_daily(values);
    let features = FeatureExtractor::default().extract(&daily)?;
    EnsembleForecaster::new(ForecastConfig::default()).forecast(&daily, &features, horizon)
}

#[test]
fn test_holt_winters_reproduces_a_pure_cycle() {
    let data: Vec<f64> = (0..28).map(|i| 100.0 + WEEK[i % 7]).collect();
    let model = HoltWinters::new(7, SmoothingParams::default()).unwrap();
    let trained = model.train_boxed(&data).unwrap();
    let forecast = trained.forecast(7).unwrap();

    for (h, value) in forecast.values().iter().enumerate() {
        assert_abs_diff_eq!(*value, 100.0 + WEEK[(28 + h) % 7], epsilon = 1e-9);
    }
    assert_abs_diff_eq!(trained.residual_std(), 0.0, epsilon = 1e-9);
    assert!(trained.name().starts_with("Holt-Winters"));
}

#[test]
fn test_holt_winters_parameter_validation() {
    assert!(HoltWinters::new(1, SmoothingParams::default()).is_err());
    let params = SmoothingParams {
        alpha: 1.5,
        ..SmoothingParams::default()
    };
    assert!(matches!(
        HoltWinters::new(7, params),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_models_refuse_short_series() {
    let hw = HoltWinters::new(7, SmoothingParams::default()).unwrap();
    let ar = AutoRegressive::new(7).unwrap();
    assert_eq!(hw.min_observations(), 14);
    assert_eq!(ar.min_observations(), 15);
    assert!(matches!(hw.train(&[1.0; 13]), Err(ForecastError::Model(_))));
    assert!(matches!(ar.train(&[1.0; 14]), Err(ForecastError::Model(_))));
}

#[test]
fn test_standard_errors_grow_with_horizon() {
    let data = noisy(40, false, 3);
    let trained = AutoRegressive::new(2).unwrap().train(&data).unwrap();
    let forecast = trained.forecast(5).unwrap();
    let errors = forecast.std_errors();

    assert!(errors.windows(2).all(|w| w[0] <= w[1]));
    assert_abs_diff_eq!(errors[3], 2.0 * errors[0], epsilon = 1e-9);
}

#[test]
fn test_ensemble_on_a_weekly_series() {
    let values = noisy(60, true, 42);
    let ensemble = ensemble_for(&values, 14).unwrap();

    assert_eq!(ensemble.points.len(), 14);
    assert_eq!(
        ensemble.points[0].date,
        NaiveDate::from_ymd_opt(2024, 1, 7).unwrap() + Duration::days(60)
    );
    for point in &ensemble.points {
        assert!(point.confidence_interval.lower >= 0.0);
        assert!(point.confidence_interval.contains(point.predicted_sales));
        assert!(point.predicted_transactions > 0);
    }

    let total: f64 = ensemble.weights.iter().map(|w| w.weight).sum();
    assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
    assert_eq!(ensemble.weights.len(), 2);
    assert!((0.0..=1.0).contains(&ensemble.model_confidence));
    assert_eq!(ensemble.seasonal_components.cycle_length_days, 7);
}

#[test]
fn test_ensemble_intervals_widen() {
    let values = noisy(60, false, 7);
    let ensemble = ensemble_for(&values, 14).unwrap();

    let half_width = |i: usize| {
        let point = &ensemble.points[i];
        point.confidence_interval.upper - point.predicted_sales
    };
    assert!(half_width(13) > half_width(0));
}

#[test]
fn test_ensemble_rejects_zero_horizon() {
    let values = noisy(30, true, 1);
    assert!(matches!(
        ensemble_for(&values, 0),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_ensemble_needs_room_for_a_backtest() {
    // Too short to detect a cycle, so the default weekly cycle is used
    let values = noisy(7, false, 9);
    assert!(matches!(
        ensemble_for(&values, 3),
        Err(ForecastError::Model(_))
    ));
}
