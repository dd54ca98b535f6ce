//! Weighted ensemble of the statistical models
//!
//! Each member is backtested on the last days of the series, weighted by its
//! inverse holdout MAPE, refitted on the full series and combined into a
//! single forecast with horizon-dependent confidence intervals.

use crate::config::ForecastConfig;
use crate::data::{sales_values, DailySeriesPoint};
use crate::error::{ForecastError, Result};
use crate::features::SeriesFeatures;
use crate::metrics::{confidence_from_accuracy, mean_absolute_percentage_error, AccuracyMetrics};
use crate::models::{
    AutoRegressive, ForecastModel, HoltWinters, ModelForecast, TrainedForecastModel,
};
use crate::result::{ConfidenceInterval, ForecastPoint};
use crate::seasonality::{detect_seasonality, normalized_trend, SeasonalComponents};
use crate::utils::{future_dates, holdout_split};
use sales_math::finite_or;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

/// Added to each MAPE before inverting so a perfect backtest keeps a finite weight
const MAPE_FLOOR: f64 = 0.01;

/// Share of the ensemble given to one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelWeight {
    pub model: String,
    pub weight: f64,
    /// Holdout MAPE of the member, as a fraction
    pub backtest_mape: Option<f64>,
}

/// Output of [`EnsembleForecaster::forecast`]
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleForecast {
    pub points: Vec<ForecastPoint>,
    pub accuracy_metrics: AccuracyMetrics,
    pub seasonal_components: SeasonalComponents,
    pub model_confidence: f64,
    pub weights: Vec<ModelWeight>,
}

#[derive(Debug, Clone)]
enum Member {
    Smoothing(HoltWinters),
    Autoregressive(AutoRegressive),
}

impl Member {
    fn train(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        match self {
            Member::Smoothing(model) => model.train_boxed(data),
            Member::Autoregressive(model) => model.train_boxed(data),
        }
    }

    fn min_observations(&self) -> usize {
        match self {
            Member::Smoothing(model) => model.min_observations(),
            Member::Autoregressive(model) => model.min_observations(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Member::Smoothing(model) => model.name(),
            Member::Autoregressive(model) => model.name(),
        }
    }
}

/// Combines Holt-Winters and autoregressive forecasts
#[derive(Debug, Clone)]
pub struct EnsembleForecaster {
    config: ForecastConfig,
}

impl EnsembleForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Forecast `horizon` days after the last day of `daily`
    pub fn forecast(
        &self,
        daily: &[DailySeriesPoint],
        features: &SeriesFeatures,
        horizon: usize,
    ) -> Result<EnsembleForecast> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be at least 1 day".to_string(),
            ));
        }
        let last_date = daily
            .last()
            .map(|p| p.date)
            .ok_or_else(|| ForecastError::NoData("empty daily series".to_string()))?;

        let values = sales_values(daily);
        let n = values.len();
        let profile = detect_seasonality(
            &values,
            self.config.default_cycle_length,
            self.config.max_cycle_length,
            self.config.min_cycle_correlation,
        );
        let cycle = profile.cycle_length;

        let members = vec![
            Member::Smoothing(HoltWinters::new(cycle, self.config.smoothing)?),
            Member::Autoregressive(AutoRegressive::new(cycle)?),
        ];

        let holdout = cycle.min(n / 4).max(1);
        let required = members
            .iter()
            .map(Member::min_observations)
            .max()
            .unwrap_or(0);
        if n < holdout + required {
            return Err(ForecastError::Model(format!(
                "{} days are too short for a {}-day cycle, need at least {}",
                n,
                cycle,
                holdout + required
            )));
        }

        // Backtest on the holdout
        let (train, test) = holdout_split(&values, holdout);
        let mut backtests = Vec::with_capacity(members.len());
        let mut mapes = Vec::with_capacity(members.len());
        for member in &members {
            let predicted = member.train(train)?.forecast(holdout)?;
            mapes.push(mean_absolute_percentage_error(test, predicted.values()));
            backtests.push(predicted);
        }
        let weights = inverse_error_weights(&mapes);
        let backtest = combine(&backtests, &weights, ModelForecast::values);
        let accuracy_metrics = AccuracyMetrics::evaluate(&backtest, test);
        let model_confidence = confidence_from_accuracy(&accuracy_metrics);

        debug!(
            cycle,
            detected = profile.detected,
            holdout,
            %accuracy_metrics,
            "ensemble backtest complete"
        );

        // Refit on everything and combine
        let forecasts = members
            .iter()
            .map(|member| member.train(&values)?.forecast(horizon))
            .collect::<Result<Vec<_>>>()?;
        let predictions = combine(&forecasts, &weights, ModelForecast::values);
        let std_errors = combine(&forecasts, &weights, ModelForecast::std_errors);

        let z = z_score(self.config.confidence_level)?;
        let dates = future_dates(last_date, horizon)?;
        let transactions = TransactionEstimator::from_history(daily);

        let mut points = Vec::with_capacity(horizon);
        for (i, date) in dates.into_iter().enumerate() {
            let h = (i + 1) as f64;
            let predicted = predictions[i].max(0.0);
            let volatility_band =
                self.config.volatility_weight * features.volatility * predicted.abs() * h.sqrt();
            let half_width = z * (std_errors[i].powi(2) + volatility_band.powi(2)).sqrt();

            if !predicted.is_finite() || !half_width.is_finite() {
                return Err(ForecastError::Model(format!(
                    "ensemble produced a non-finite forecast for {}",
                    date
                )));
            }

            points.push(ForecastPoint::new(
                date,
                predicted,
                transactions.estimate(predicted),
                ConfidenceInterval::new((predicted - half_width).max(0.0), predicted + half_width),
            ));
        }

        Ok(EnsembleForecast {
            points,
            accuracy_metrics,
            seasonal_components: SeasonalComponents {
                trend: normalized_trend(features.slope(), features.mean()),
                seasonal_strength: profile.strength,
                cycle_length_days: cycle,
            },
            model_confidence,
            weights: members
                .iter()
                .zip(&weights)
                .zip(&mapes)
                .map(|((member, weight), mape)| ModelWeight {
                    model: member.name().to_string(),
                    weight: *weight,
                    backtest_mape: *mape,
                })
                .collect(),
        })
    }
}

/// Weights proportional to `1 / (mape + 0.01)`; equal when any MAPE is undefined
pub fn inverse_error_weights(mapes: &[Option<f64>]) -> Vec<f64> {
    if mapes.is_empty() {
        return Vec::new();
    }
    let equal = vec![1.0 / mapes.len() as f64; mapes.len()];

    let inverse: Option<Vec<f64>> = mapes
        .iter()
        .map(|m| m.map(|mape| 1.0 / (mape.max(0.0) + MAPE_FLOOR)))
        .collect();
    match inverse {
        Some(inverse) => {
            let total: f64 = inverse.iter().sum();
            if total > 0.0 && total.is_finite() {
                inverse.iter().map(|w| w / total).collect()
            } else {
                equal
            }
        }
        None => equal,
    }
}

fn combine(
    forecasts: &[ModelForecast],
    weights: &[f64],
    select: fn(&ModelForecast) -> &[f64],
) -> Vec<f64> {
    let horizon = forecasts.first().map(ModelForecast::horizon).unwrap_or(0);
    (0..horizon)
        .map(|i| {
            forecasts
                .iter()
                .zip(weights)
                .map(|(forecast, weight)| weight * select(forecast)[i])
                .sum()
        })
        .collect()
}

/// Two-sided standard normal quantile for `level`
pub fn z_score(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "confidence level {} must lie strictly between 0 and 1",
            level
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::Model(e.to_string()))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}

/// Converts predicted sales into a transaction count
#[derive(Debug, Clone, Copy)]
pub(crate) enum TransactionEstimator {
    /// Sales divided by the historical average transaction value
    AverageValue(f64),
    /// No usable average value, fall back to the mean daily count
    MeanCount(u64),
}

impl TransactionEstimator {
    pub(crate) fn from_history(daily: &[DailySeriesPoint]) -> Self {
        let sales: f64 = daily.iter().map(|p| p.total_sales).sum();
        let count: u64 = daily.iter().map(|p| p.transaction_count).sum();

        if count > 0 && sales > 0.0 {
            return TransactionEstimator::AverageValue(sales / count as f64);
        }
        let mean_count = if daily.is_empty() {
            0.0
        } else {
            count as f64 / daily.len() as f64
        };
        TransactionEstimator::MeanCount(mean_count.round() as u64)
    }

    pub(crate) fn estimate(&self, predicted_sales: f64) -> u64 {
        match *self {
            TransactionEstimator::AverageValue(atv) => {
                finite_or((predicted_sales / atv).round(), 0.0).max(0.0) as u64
            }
            TransactionEstimator::MeanCount(count) => count,
        }
    }
}
