//! Boundary to an optional external forecast refinement service

use crate::error::{AugmentationError, Result};
use crate::features::{SeriesFeatures, TrendDirection};
use crate::result::{ForecastPoint, ForecastResult, ForecastResultBuilder, ForecastTier, Insights};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Compact description of the history sent along with the ensemble result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub observations: usize,
    pub mean_sales: f64,
    pub trend_slope: f64,
    pub trend_direction: TrendDirection,
    pub volatility: f64,
    /// Average sales per weekday, Sunday first
    pub weekly_pattern: [f64; 7],
    pub seasonal_strength: f64,
    pub cycle_length_days: usize,
}

impl FeatureSummary {
    pub fn new(features: &SeriesFeatures, ensemble: &ForecastResult) -> Self {
        Self {
            observations: features.observations,
            mean_sales: features.mean(),
            trend_slope: features.slope(),
            trend_direction: features.trend_direction,
            volatility: features.volatility,
            weekly_pattern: features.weekly_pattern,
            seasonal_strength: ensemble.seasonal_components.seasonal_strength,
            cycle_length_days: ensemble.seasonal_components.cycle_length_days,
        }
    }
}

/// Payload handed to a [`ForecastAugmenter`]
#[derive(Debug, Clone, Serialize)]
pub struct AugmentationRequest {
    pub store_id: String,
    pub forecast_days: usize,
    pub ensemble: ForecastResult,
    pub features: FeatureSummary,
}

/// External service that may refine a statistical forecast
///
/// The response must follow the serialized `ForecastResult` shape; at least a
/// `forecasts` array is required. Every error kind is handled identically by
/// the controller.
#[async_trait]
pub trait ForecastAugmenter: Send + Sync {
    async fn augment(
        &self,
        request: &AugmentationRequest,
    ) -> std::result::Result<Value, AugmentationError>;
}

#[derive(Debug, Deserialize)]
struct AugmentedPayload {
    forecasts: Vec<ForecastPoint>,
    #[serde(default)]
    insights: Option<Insights>,
}

/// Turn an augmentation response into a validated result
///
/// Points and insights come from the response; confidence, accuracy metrics
/// and seasonal components stay those of the ensemble it refines.
pub fn parse_augmented(
    response: Value,
    ensemble: &ForecastResult,
    forecast_days: usize,
) -> Result<ForecastResult> {
    match response.get("forecasts") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(AugmentationError::Malformed("`forecasts` is not an array".to_string()).into())
        }
        None => return Err(AugmentationError::Malformed("missing `forecasts`".to_string()).into()),
    }

    let payload: AugmentedPayload = serde_json::from_value(response)
        .map_err(|e| AugmentationError::Malformed(e.to_string()))?;

    let first_date = ensemble
        .forecasts
        .first()
        .map(|p| p.date)
        .ok_or_else(|| AugmentationError::Malformed("ensemble result is empty".to_string()))?;

    ForecastResultBuilder::new(ensemble.store_id.clone(), ForecastTier::Augmented)
        .forecast_id(ensemble.forecast_id)
        .points(payload.forecasts)
        .model_confidence(ensemble.model_confidence)
        .accuracy_metrics(ensemble.accuracy_metrics)
        .seasonal_components(ensemble.seasonal_components)
        .advanced_metrics(ensemble.advanced_metrics)
        .insights(payload.insights.unwrap_or_else(|| ensemble.insights.clone()))
        .build(forecast_days, first_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;
    use crate::result::ConfidenceInterval;
    use chrono::NaiveDate;
    use serde_json::json;

    fn ensemble() -> ForecastResult {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        ForecastResultBuilder::new("store", ForecastTier::Ensemble)
            .points(vec![ForecastPoint::new(
                date,
                100.0,
                10,
                ConfidenceInterval::new(90.0, 110.0),
            )])
            .model_confidence(0.8)
            .build(1, date)
            .unwrap()
    }

    #[test]
    fn test_valid_response_keeps_ensemble_confidence() {
        let response = json!({
            "forecasts": [{
                "date": "2024-05-01",
                "predicted_sales": 105.0,
                "predicted_transactions": 11,
                "confidence_interval": {"lower": 95.0, "upper": 115.0}
            }],
            "model_confidence": 0.99
        });
        let source = ensemble();
        let result = parse_augmented(response, &source, 1).unwrap();

        assert_eq!(result.algorithm_used, ForecastTier::Augmented);
        assert_eq!(result.model_confidence, 0.8);
        assert_eq!(result.forecast_id, source.forecast_id);
        assert_eq!(result.forecasts[0].predicted_sales, 105.0);
    }

    #[test]
    fn test_non_array_forecasts_is_malformed() {
        let err = parse_augmented(json!({"forecasts": "soon"}), &ensemble(), 1).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::Augmentation(AugmentationError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_length_fails_validation() {
        let err = parse_augmented(json!({"forecasts": []}), &ensemble(), 1).unwrap_err();
        assert!(matches!(err, ForecastError::StructuralValidation(_)));
    }
}
