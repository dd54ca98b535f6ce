//! Ordinary least squares trend fitting
//!
//! Fits `y = intercept + slope * x` against a 0-based index, which is how
//! daily sales trends are measured throughout the pipeline.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Result of a least-squares fit of a series against its index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Change in value per index step
    pub slope: f64,
    /// Fitted value at index 0
    pub intercept: f64,
    /// Coefficient of determination, 0 for a constant series
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit a line through `values` using their positions as x
    ///
    /// Uses the closed form
    /// `slope = (nΣxy − ΣxΣy) / (nΣx² − (Σx)²)` and
    /// `intercept = (Σy − slope·Σx) / n`.
    pub fn fit(values: &[f64]) -> Result<Self> {
        let n = values.len();
        if n < 2 {
            return Err(MathError::InsufficientData(format!(
                "Linear regression needs at least 2 points, got {}",
                n
            )));
        }

        let nf = n as f64;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut sum_xy = 0.0;
        let mut sum_xx = 0.0;

        for (i, &y) in values.iter().enumerate() {
            let x = i as f64;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        let denominator = nf * sum_xx - sum_x * sum_x;
        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / nf;

        if !slope.is_finite() || !intercept.is_finite() {
            return Err(MathError::CalculationError(
                "Regression produced non-finite coefficients".to_string(),
            ));
        }

        let y_mean = sum_y / nf;
        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;
        for (i, &y) in values.iter().enumerate() {
            let predicted = intercept + slope * i as f64;
            ss_total += (y - y_mean).powi(2);
            ss_residual += (y - predicted).powi(2);
        }

        let r_squared = if ss_total.abs() < 1e-12 {
            0.0
        } else {
            1.0 - ss_residual / ss_total
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    /// Value of the fitted line at index `x`
    pub fn value_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Residuals `y[i] - fitted(i)` for the series the line was fitted on
    pub fn residuals(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &y)| y - self.value_at(i as f64))
            .collect()
    }
}

/// Coefficient of determination of `predicted` against `actual`
///
/// Returns 0 when the actual series has no variance or the inputs are empty.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }

    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_total: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    if ss_total.abs() < 1e-12 {
        return 0.0;
    }

    let ss_residual: f64 = actual[..n]
        .iter()
        .zip(&predicted[..n])
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    crate::finite_or(1.0 - ss_residual / ss_total, 0.0)
}
