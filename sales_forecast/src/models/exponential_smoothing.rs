//! Additive Holt-Winters exponential smoothing

use crate::config::SmoothingParams;
use crate::error::{ForecastError, Result};
use crate::models::{
    ensure_length, horizon_std_errors, ForecastModel, ModelForecast, TrainedForecastModel,
};
use sales_math::descriptive::mean;

const ALPHA_GRID: [f64; 6] = [0.1, 0.2, 0.3, 0.5, 0.7, 0.9];
const BETA_GRID: [f64; 4] = [0.01, 0.05, 0.1, 0.2];
const GAMMA_GRID: [f64; 4] = [0.05, 0.1, 0.2, 0.4];

/// Triple exponential smoothing with level, trend and an additive seasonal cycle
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Name of the model
    name: String,
    /// Length of the seasonal cycle
    cycle: usize,
    /// Smoothing parameters
    params: SmoothingParams,
}

/// Trained Holt-Winters model
#[derive(Debug, Clone)]
pub struct TrainedHoltWinters {
    name: String,
    cycle: usize,
    alpha: f64,
    beta: f64,
    gamma: f64,
    /// Level after the last observation
    level: f64,
    /// Trend after the last observation
    trend: f64,
    /// Seasonal offsets indexed by `t % cycle`
    seasonals: Vec<f64>,
    /// Number of observations seen
    observations: usize,
    residuals: Vec<f64>,
}

struct SmoothingState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    residuals: Vec<f64>,
    sse: f64,
}

impl HoltWinters {
    /// Create a new Holt-Winters model for a cycle of `cycle` days
    pub fn new(cycle: usize, params: SmoothingParams) -> Result<Self> {
        if cycle < 2 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal cycle must be at least 2".to_string(),
            ));
        }
        for (label, value) in [("Alpha", params.alpha), ("Beta", params.beta), ("Gamma", params.gamma)] {
            if value <= 0.0 || value >= 1.0 {
                return Err(ForecastError::InvalidParameter(format!(
                    "{} must be between 0 and 1",
                    label
                )));
            }
        }

        Ok(Self {
            name: format!("Holt-Winters (cycle={})", cycle),
            cycle,
            params,
        })
    }

    pub fn cycle(&self) -> usize {
        self.cycle
    }

    fn smooth(&self, data: &[f64], alpha: f64, beta: f64, gamma: f64) -> SmoothingState {
        let m = self.cycle;
        let first = mean(&data[..m]);
        let second = mean(&data[m..2 * m]);

        let mut level = first;
        let mut trend = (second - first) / m as f64;
        let mut seasonals: Vec<f64> = data[..m].iter().map(|y| y - first).collect();
        let mut residuals = Vec::with_capacity(data.len() - m);

        for (t, &y) in data.iter().enumerate().skip(m) {
            let season = seasonals[t % m];
            residuals.push(y - (level + trend + season));

            let previous_level = level;
            level = alpha * (y - season) + (1.0 - alpha) * (level + trend);
            trend = beta * (level - previous_level) + (1.0 - beta) * trend;
            seasonals[t % m] = gamma * (y - level) + (1.0 - gamma) * season;
        }

        let sse = residuals.iter().map(|r| r * r).sum();
        SmoothingState {
            level,
            trend,
            seasonals,
            residuals,
            sse,
        }
    }

    /// Parameters minimising the one-step squared error over a small grid
    fn optimized_params(&self, data: &[f64]) -> (f64, f64, f64) {
        let mut best = (self.params.alpha, self.params.beta, self.params.gamma);
        let mut best_sse = self.smooth(data, best.0, best.1, best.2).sse;

        for &alpha in &ALPHA_GRID {
            for &beta in &BETA_GRID {
                for &gamma in &GAMMA_GRID {
                    let sse = self.smooth(data, alpha, beta, gamma).sse;
                    if sse.is_finite() && sse < best_sse {
                        best_sse = sse;
                        best = (alpha, beta, gamma);
                    }
                }
            }
        }

        best
    }
}

impl ForecastModel for HoltWinters {
    type Trained = TrainedHoltWinters;

    fn train(&self, data: &[f64]) -> Result<Self::Trained> {
        ensure_length(&self.name, data, self.min_observations())?;

        let (alpha, beta, gamma) = if self.params.optimize {
            self.optimized_params(data)
        } else {
            (self.params.alpha, self.params.beta, self.params.gamma)
        };
        let state = self.smooth(data, alpha, beta, gamma);

        if !state.level.is_finite() || !state.trend.is_finite() {
            return Err(ForecastError::Model(format!(
                "{} diverged while smoothing",
                self.name
            )));
        }

        Ok(TrainedHoltWinters {
            name: self.name.clone(),
            cycle: self.cycle,
            alpha,
            beta,
            gamma,
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            observations: data.len(),
            residuals: state.residuals,
        })
    }

    fn min_observations(&self) -> usize {
        2 * self.cycle
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedHoltWinters {
    /// Smoothing parameters actually used, as (alpha, beta, gamma)
    pub fn parameters(&self) -> (f64, f64, f64) {
        (self.alpha, self.beta, self.gamma)
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }
}

impl TrainedForecastModel for TrainedHoltWinters {
    fn forecast(&self, horizon: usize) -> Result<ModelForecast> {
        let values = (1..=horizon)
            .map(|h| {
                let season = self.seasonals[(self.observations - 1 + h) % self.cycle];
                self.level + h as f64 * self.trend + season
            })
            .collect();

        ModelForecast::new(values, horizon_std_errors(self.residual_std(), horizon))
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fixed_params() -> SmoothingParams {
        SmoothingParams {
            optimize: false,
            ..SmoothingParams::default()
        }
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(HoltWinters::new(1, SmoothingParams::default()).is_err());
        let bad = SmoothingParams {
            gamma: 1.0,
            ..SmoothingParams::default()
        };
        assert!(HoltWinters::new(7, bad).is_err());
    }

    #[test]
    fn test_requires_two_cycles() {
        let model = HoltWinters::new(7, fixed_params()).unwrap();
        assert!(matches!(
            model.train(&[1.0; 13]),
            Err(ForecastError::Model(_))
        ));
        assert!(model.train(&[1.0; 14]).is_ok());
    }

    #[test]
    fn test_constant_series_forecasts_constant() {
        let model = HoltWinters::new(7, fixed_params()).unwrap();
        let trained = model.train(&[50.0; 28]).unwrap();
        let forecast = trained.forecast(5).unwrap();
        for value in forecast.values() {
            assert_abs_diff_eq!(*value, 50.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(trained.residual_std(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_repeats_a_clean_weekly_pattern() {
        let pattern = [10.0, 12.0, 11.0, 13.0, 20.0, 30.0, 25.0];
        let data: Vec<f64> = (0..42).map(|i| pattern[i % 7]).collect();
        let model = HoltWinters::new(7, SmoothingParams::default()).unwrap();
        let trained = model.train(&data).unwrap();
        let forecast = trained.forecast(7).unwrap();

        for (h, value) in forecast.values().iter().enumerate() {
            assert_abs_diff_eq!(*value, pattern[(42 + h) % 7], epsilon = 1.0);
        }
    }
}
