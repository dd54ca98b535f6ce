//! Metrics for evaluating forecast performance

use serde::{Deserialize, Serialize};

/// Backtest accuracy of a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    /// Mean absolute percentage error as a fraction; `None` when every actual was 0
    pub mape: Option<f64>,
    /// Coefficient of determination against the held-out actuals
    pub r_squared: f64,
}

impl AccuracyMetrics {
    /// Evaluate `predicted` against `actual`, pairwise over the shorter length
    pub fn evaluate(predicted: &[f64], actual: &[f64]) -> Self {
        Self {
            mape: mean_absolute_percentage_error(actual, predicted),
            r_squared: sales_math::regression::r_squared(actual, predicted),
        }
    }

    /// Metrics for a tier that has no backtest
    pub fn unavailable() -> Self {
        Self {
            mape: None,
            r_squared: 0.0,
        }
    }
}

impl std::fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mape {
            Some(mape) => write!(f, "MAPE {:.2}%", mape * 100.0)?,
            None => write!(f, "MAPE n/a")?,
        }
        write!(f, ", R² {:.3}", self.r_squared)
    }
}

/// Mean of `|predicted − actual| / actual` over days with a non-zero actual
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| a.abs() > f64::EPSILON)
        .map(|(a, p)| (p - a).abs() / a.abs())
        .collect();

    if errors.is_empty() {
        return None;
    }
    Some(errors.iter().sum::<f64>() / errors.len() as f64)
}

/// Map backtest accuracy onto a confidence score in [0, 1]
///
/// 70% comes from MAPE (capped at 100%) and 30% from R² clamped to [0, 1];
/// an undefined MAPE contributes a neutral 0.5.
pub fn confidence_from_accuracy(metrics: &AccuracyMetrics) -> f64 {
    let mape_term = match metrics.mape {
        Some(mape) => 1.0 - mape.clamp(0.0, 1.0),
        None => 0.5,
    };
    let r2_term = if metrics.r_squared.is_finite() {
        metrics.r_squared.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (0.7 * mape_term + 0.3 * r2_term).clamp(0.0, 1.0)
}
