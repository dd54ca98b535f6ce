//! Canonical forecast result, its builder and the structural validator
//!
//! Every tier (augmented, ensemble, naive) assembles its output through
//! [`ForecastResultBuilder`], and every result passes [`validate_result`]
//! before it leaves the controller.

use crate::error::{ForecastError, Result};
use crate::metrics::AccuracyMetrics;
use crate::seasonality::SeasonalComponents;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which tier produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecastTier {
    /// Ensemble output refined by the augmentation service
    #[serde(rename = "augmented_ensemble")]
    Augmented,
    /// Statistical ensemble output
    #[serde(rename = "statistical_ensemble")]
    Ensemble,
    /// Historical-average fallback
    #[serde(rename = "naive_average")]
    Naive,
}

impl fmt::Display for ForecastTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ForecastTier::Augmented => "augmented_ensemble",
            ForecastTier::Ensemble => "statistical_ensemble",
            ForecastTier::Naive => "naive_average",
        };
        f.write_str(label)
    }
}

/// Uncertainty band around a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Forecast for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_sales: f64,
    pub predicted_transactions: u64,
    pub confidence_interval: ConfidenceInterval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_sales: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_transactions: Option<u64>,
}

impl ForecastPoint {
    pub fn new(
        date: NaiveDate,
        predicted_sales: f64,
        predicted_transactions: u64,
        confidence_interval: ConfidenceInterval,
    ) -> Self {
        Self {
            date,
            predicted_sales,
            predicted_transactions,
            confidence_interval,
            actual_sales: None,
            actual_transactions: None,
        }
    }
}

/// Narrative summary attached to every forecast
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insights {
    pub period: String,
    /// Forecast average versus historical average, in percent
    pub growth_rate: f64,
    pub seasonality_pattern: String,
    pub peak_days: Vec<String>,
    pub recommended_actions: Vec<String>,
    /// Equal to the result's model confidence
    pub accuracy_score: f64,
    pub risk_factors: Vec<String>,
    pub opportunity_indicators: Vec<String>,
    pub algorithm_analysis: String,
}

/// Optional derived indicators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    pub volatility_index: f64,
    pub trend_strength: f64,
    pub seasonal_factor: f64,
    /// 0–100
    pub revenue_optimization_score: f64,
}

/// The single forecast shape returned by every tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub forecast_id: Uuid,
    pub store_id: String,
    pub algorithm_used: ForecastTier,
    pub model_confidence: f64,
    pub accuracy_metrics: AccuracyMetrics,
    pub seasonal_components: SeasonalComponents,
    pub forecasts: Vec<ForecastPoint>,
    pub insights: Insights,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_metrics: Option<AdvancedMetrics>,
    pub generated_at: DateTime<Utc>,
}

impl ForecastResult {
    /// Number of forecast days
    pub fn horizon(&self) -> usize {
        self.forecasts.len()
    }
}

/// Assembles a [`ForecastResult`] and validates it on `build`
#[derive(Debug, Clone)]
pub struct ForecastResultBuilder {
    store_id: String,
    tier: ForecastTier,
    forecast_id: Option<Uuid>,
    points: Vec<ForecastPoint>,
    model_confidence: f64,
    accuracy_metrics: AccuracyMetrics,
    seasonal_components: SeasonalComponents,
    insights: Insights,
    advanced_metrics: Option<AdvancedMetrics>,
}

impl ForecastResultBuilder {
    pub fn new(store_id: impl Into<String>, tier: ForecastTier) -> Self {
        Self {
            store_id: store_id.into(),
            tier,
            forecast_id: None,
            points: Vec::new(),
            model_confidence: 0.0,
            accuracy_metrics: AccuracyMetrics::unavailable(),
            seasonal_components: SeasonalComponents {
                trend: 0.0,
                seasonal_strength: 0.0,
                cycle_length_days: 0,
            },
            insights: Insights::default(),
            advanced_metrics: None,
        }
    }

    /// Reuse an existing id, e.g. when a refined result replaces its source
    pub fn forecast_id(mut self, id: Uuid) -> Self {
        self.forecast_id = Some(id);
        self
    }

    pub fn points(mut self, points: Vec<ForecastPoint>) -> Self {
        self.points = points;
        self
    }

    pub fn model_confidence(mut self, confidence: f64) -> Self {
        self.model_confidence = confidence;
        self
    }

    pub fn accuracy_metrics(mut self, metrics: AccuracyMetrics) -> Self {
        self.accuracy_metrics = metrics;
        self
    }

    pub fn seasonal_components(mut self, components: SeasonalComponents) -> Self {
        self.seasonal_components = components;
        self
    }

    pub fn insights(mut self, insights: Insights) -> Self {
        self.insights = insights;
        self
    }

    pub fn advanced_metrics(mut self, metrics: Option<AdvancedMetrics>) -> Self {
        self.advanced_metrics = metrics;
        self
    }

    /// Finish the result and check it against the expected shape
    ///
    /// `insights.accuracy_score` is always set to the model confidence.
    pub fn build(mut self, expected_days: usize, first_date: NaiveDate) -> Result<ForecastResult> {
        self.insights.accuracy_score = self.model_confidence;

        let result = ForecastResult {
            forecast_id: self.forecast_id.unwrap_or_else(Uuid::new_v4),
            store_id: self.store_id,
            algorithm_used: self.tier,
            model_confidence: self.model_confidence,
            accuracy_metrics: self.accuracy_metrics,
            seasonal_components: self.seasonal_components,
            forecasts: self.points,
            insights: self.insights,
            advanced_metrics: self.advanced_metrics,
            generated_at: Utc::now(),
        };

        validate_result(&result, expected_days, first_date)?;
        Ok(result)
    }
}

/// Structural check shared by all tiers
///
/// Requires exactly `expected_days` consecutive days starting at `first_date`,
/// finite non-negative predictions inside well-formed intervals and a
/// confidence within [0, 1].
pub fn validate_result(
    result: &ForecastResult,
    expected_days: usize,
    first_date: NaiveDate,
) -> Result<()> {
    let fail = |msg: String| Err(ForecastError::StructuralValidation(msg));

    if result.forecasts.is_empty() {
        return fail(format!("{} produced no forecast points", result.algorithm_used));
    }
    if result.forecasts.len() != expected_days {
        return fail(format!(
            "{} produced {} points, expected {}",
            result.algorithm_used,
            result.forecasts.len(),
            expected_days
        ));
    }
    if !(0.0..=1.0).contains(&result.model_confidence) {
        return fail(format!(
            "model confidence {} is outside [0, 1]",
            result.model_confidence
        ));
    }
    if !(0.0..=1.0).contains(&result.insights.accuracy_score) {
        return fail(format!(
            "accuracy score {} is outside [0, 1]",
            result.insights.accuracy_score
        ));
    }

    let mut expected_date = first_date;
    for point in &result.forecasts {
        if point.date != expected_date {
            return fail(format!(
                "expected a point for {}, found {}",
                expected_date, point.date
            ));
        }
        let ci = point.confidence_interval;
        if !point.predicted_sales.is_finite() || !ci.lower.is_finite() || !ci.upper.is_finite() {
            return fail(format!("non-finite values on {}", point.date));
        }
        if point.predicted_sales < 0.0 {
            return fail(format!("negative prediction on {}", point.date));
        }
        if !ci.contains(point.predicted_sales) {
            return fail(format!(
                "prediction {} on {} lies outside [{}, {}]",
                point.predicted_sales, point.date, ci.lower, ci.upper
            ));
        }
        expected_date = match expected_date.succ_opt() {
            Some(next) => next,
            None => return fail("forecast runs past the end of the calendar".to_string()),
        };
    }

    Ok(())
}
