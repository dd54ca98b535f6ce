//! Forecasting models for daily sales series

use crate::error::{ForecastError, Result};
use std::fmt::Debug;

pub mod autoregressive;
pub mod exponential_smoothing;

pub use autoregressive::{AutoRegressive, TrainedAutoRegressive};
pub use exponential_smoothing::{HoltWinters, TrainedHoltWinters};

/// Point forecasts of a single model with their standard errors
#[derive(Debug, Clone, PartialEq)]
pub struct ModelForecast {
    values: Vec<f64>,
    std_errors: Vec<f64>,
}

impl ModelForecast {
    /// Create a forecast, checking lengths and finiteness
    pub fn new(values: Vec<f64>, std_errors: Vec<f64>) -> Result<Self> {
        if values.len() != std_errors.len() {
            return Err(ForecastError::Model(format!(
                "Values length ({}) doesn't match standard errors length ({})",
                values.len(),
                std_errors.len()
            )));
        }
        if values.iter().chain(&std_errors).any(|v| !v.is_finite()) {
            return Err(ForecastError::Model(
                "Model produced a non-finite forecast".to_string(),
            ));
        }

        Ok(Self { values, std_errors })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn std_errors(&self) -> &[f64] {
        &self.std_errors
    }

    pub fn horizon(&self) -> usize {
        self.values.len()
    }
}

/// Standard errors growing with the square root of the horizon
pub fn horizon_std_errors(residual_std: f64, horizon: usize) -> Vec<f64> {
    (1..=horizon)
        .map(|h| residual_std * (h as f64).sqrt())
        .collect()
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug + Send + Sync {
    /// Forecast the next `horizon` values after the training data
    fn forecast(&self, horizon: usize) -> Result<ModelForecast>;

    /// One-step-ahead in-sample errors
    fn residuals(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;

    /// Root mean square of the in-sample residuals
    fn residual_std(&self) -> f64 {
        let residuals = self.residuals();
        if residuals.is_empty() {
            return 0.0;
        }
        let mse = residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64;
        sales_math::finite_or(mse.sqrt(), 0.0)
    }
}

/// Forecast model that can be trained on a series of daily values
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel + 'static;

    /// Train the model on `data`, oldest value first
    fn train(&self, data: &[f64]) -> Result<Self::Trained>;

    /// Shortest series the model can be trained on
    fn min_observations(&self) -> usize;

    /// Get the name of the model
    fn name(&self) -> &str;

    /// Train and erase the concrete type
    fn train_boxed(&self, data: &[f64]) -> Result<Box<dyn TrainedForecastModel>> {
        Ok(Box::new(self.train(data)?))
    }
}

/// Fail with a model error when `data` is shorter than `required`
pub(crate) fn ensure_length(name: &str, data: &[f64], required: usize) -> Result<()> {
    if data.len() < required {
        return Err(ForecastError::Model(format!(
            "Insufficient data for {}. Need at least {} observations, got {}.",
            name,
            required,
            data.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_forecast_rejects_mismatch() {
        assert!(ModelForecast::new(vec![1.0, 2.0], vec![0.1]).is_err());
        assert!(ModelForecast::new(vec![f64::NAN], vec![0.1]).is_err());
        assert_eq!(ModelForecast::new(vec![1.0], vec![0.5]).unwrap().horizon(), 1);
    }

    #[test]
    fn test_std_errors_grow_with_horizon() {
        let errors = horizon_std_errors(2.0, 4);
        assert_eq!(errors[0], 2.0);
        assert_eq!(errors[3], 4.0);
    }
}
