//! Autoregressive model on detrended sales
//!
//! The series is detrended with an OLS line, an AR(p) process is fitted to
//! the residuals by Yule-Walker (Levinson-Durbin recursion), and forecasts
//! add the recursive residual forecast back onto the extrapolated trend.

use crate::error::{ForecastError, Result};
use crate::models::{
    ensure_length, horizon_std_errors, ForecastModel, ModelForecast, TrainedForecastModel,
};
use sales_math::descriptive::mean;
use sales_math::{autocovariances, LinearFit};

/// AR(p) model over OLS residuals
#[derive(Debug, Clone)]
pub struct AutoRegressive {
    /// Name of the model
    name: String,
    /// AR order (p)
    order: usize,
}

/// Trained autoregressive model
#[derive(Debug, Clone)]
pub struct TrainedAutoRegressive {
    name: String,
    trend: LinearFit,
    /// Fitted AR coefficients, lag 1 first
    coefficients: Vec<f64>,
    /// Mean of the detrended series
    residual_mean: f64,
    /// Last `order` detrended values, oldest first
    history: Vec<f64>,
    /// Number of observations seen
    observations: usize,
    residuals: Vec<f64>,
}

impl AutoRegressive {
    /// Create a new AR model of the given order
    pub fn new(order: usize) -> Result<Self> {
        if order == 0 {
            return Err(ForecastError::InvalidParameter(
                "AR order must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!("AR({})", order),
            order,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

/// Solve the Yule-Walker equations for `order` coefficients
///
/// Stops early once the innovation variance vanishes; the remaining
/// coefficients stay 0.
fn levinson_durbin(autocov: &[f64], order: usize) -> Vec<f64> {
    let mut phi = vec![0.0; order];
    let mut error = autocov[0];
    if error.abs() < 1e-12 {
        return phi;
    }

    for k in 1..=order {
        let mut acc = autocov[k];
        for j in 1..k {
            acc -= phi[j - 1] * autocov[k - j];
        }
        let reflection = acc / error;
        if !reflection.is_finite() {
            break;
        }

        let previous = phi.clone();
        phi[k - 1] = reflection;
        for j in 1..k {
            phi[j - 1] = previous[j - 1] - reflection * previous[k - j - 1];
        }

        error *= 1.0 - reflection * reflection;
        if error <= 1e-12 {
            break;
        }
    }

    phi
}

fn predict_next(coefficients: &[f64], history: &[f64], mean: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .map(|(i, phi)| phi * (history[history.len() - 1 - i] - mean))
        .sum::<f64>()
        + mean
}

impl ForecastModel for AutoRegressive {
    type Trained = TrainedAutoRegressive;

    fn train(&self, data: &[f64]) -> Result<TrainedAutoRegressive> {
        ensure_length(&self.name, data, self.min_observations())?;

        let trend = LinearFit::fit(data)
            .map_err(|e| ForecastError::Model(format!("{} detrending failed: {}", self.name, e)))?;
        let detrended = trend.residuals(data);
        let residual_mean = mean(&detrended);

        let autocov = autocovariances(&detrended, self.order);
        let coefficients = levinson_durbin(&autocov, self.order);

        let residuals: Vec<f64> = (self.order..detrended.len())
            .map(|t| detrended[t] - predict_next(&coefficients, &detrended[..t], residual_mean))
            .collect();

        if coefficients.iter().chain(&residuals).any(|v| !v.is_finite()) {
            return Err(ForecastError::Model(format!(
                "{} produced non-finite coefficients",
                self.name
            )));
        }

        Ok(TrainedAutoRegressive {
            name: self.name.clone(),
            trend,
            coefficients,
            residual_mean,
            history: detrended[detrended.len() - self.order..].to_vec(),
            observations: data.len(),
            residuals,
        })
    }

    fn min_observations(&self) -> usize {
        2 * self.order + 1
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedAutoRegressive {
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl TrainedForecastModel for TrainedAutoRegressive {
    fn forecast(&self, horizon: usize) -> Result<ModelForecast> {
        let mut history = self.history.clone();
        let mut values = Vec::with_capacity(horizon);

        for h in 1..=horizon {
            let next = predict_next(&self.coefficients, &history, self.residual_mean);
            history.push(next);
            let x = (self.observations - 1 + h) as f64;
            values.push(self.trend.value_at(x) + next);
        }

        ModelForecast::new(values, horizon_std_errors(self.residual_std(), horizon))
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}
