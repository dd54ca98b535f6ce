//! Tiered forecast orchestration
//!
//! The controller turns raw records into one validated [`ForecastResult`]:
//!
//! 1. aggregate and extract features (input errors surface here);
//! 2. run the statistical ensemble, or the naive average if it fails;
//! 3. optionally let an augmenter refine the ensemble result under a timeout;
//! 4. issue accuracy records and alerts, then persist best-effort.

use crate::aggregate::{Aggregator, LookbackWindow};
use crate::alerts::{Alert, AlertGenerator};
use crate::augment::{parse_augmented, AugmentationRequest, FeatureSummary, ForecastAugmenter};
use crate::cache::{AnalysisCache, CacheKey, SalesAnalysis};
use crate::config::ForecastConfig;
use crate::data::{sales_values, transaction_values, RawSaleRecord};
use crate::ensemble::EnsembleForecaster;
use crate::error::{AugmentationError, ForecastError, Result};
use crate::features::FeatureExtractor;
use crate::insights::{derive_advanced_metrics, derive_insights, InsightContext};
use crate::metrics::AccuracyMetrics;
use crate::result::{
    ConfidenceInterval, ForecastPoint, ForecastResult, ForecastResultBuilder, ForecastTier,
};
use crate::seasonality::{normalized_trend, SeasonalComponents};
use crate::store::ForecastStore;
use crate::tracker::AccuracyRecord;
use crate::utils::future_dates;
use chrono::{NaiveDate, Utc};
use sales_math::descriptive::mean;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One forecast request
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub store_id: String,
    pub records: Vec<RawSaleRecord>,
    /// Defaults to the configured number of days
    pub forecast_days: Option<usize>,
    /// Last day of history to use; defaults to the latest record day
    pub as_of: Option<NaiveDate>,
}

impl ForecastRequest {
    pub fn new(store_id: impl Into<String>, records: Vec<RawSaleRecord>) -> Self {
        Self {
            store_id: store_id.into(),
            records,
            forecast_days: None,
            as_of: None,
        }
    }

    pub fn with_days(mut self, days: usize) -> Self {
        self.forecast_days = Some(days);
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

/// Everything produced for one request
#[derive(Debug, Clone, Serialize)]
pub struct ForecastOutcome {
    pub result: ForecastResult,
    pub tier: ForecastTier,
    pub accuracy_records: Vec<AccuracyRecord>,
    pub alerts: Vec<Alert>,
}

/// Orchestrates aggregation, the forecasting tiers and their side effects
pub struct ForecastController {
    config: ForecastConfig,
    aggregator: Aggregator,
    extractor: FeatureExtractor,
    ensemble: EnsembleForecaster,
    alerts: AlertGenerator,
    augmenter: Option<Arc<dyn ForecastAugmenter>>,
    cache: Option<Arc<dyn AnalysisCache>>,
    store: Option<Arc<dyn ForecastStore>>,
    /// Fixed current date; `None` reads the UTC clock
    today: Option<NaiveDate>,
}

impl ForecastController {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: Aggregator::new(config.min_history_days),
            extractor: FeatureExtractor::new(config.trend_threshold, config.min_history_days),
            ensemble: EnsembleForecaster::new(config.clone()),
            alerts: AlertGenerator::new(config.alerts),
            augmenter: None,
            cache: None,
            store: None,
            today: None,
            config,
        })
    }

    pub fn with_augmenter(mut self, augmenter: Arc<dyn ForecastAugmenter>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn AnalysisCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ForecastStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Pin the date alerts treat as today
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Aggregate and describe the request's history, using the cache when present
    pub fn analyze(&self, request: &ForecastRequest) -> Result<SalesAnalysis> {
        let window = self.resolve_window(request)?;
        let key = CacheKey::new(request.store_id.clone(), window.end(), window.day_count());

        if let Some(cache) = &self.cache {
            if let Some(analysis) = cache.get(&key) {
                return Ok(analysis);
            }
            debug!(store_id = %request.store_id, as_of = %window.end(), "analysis cache miss");
        }

        let summary = self.aggregator.summarize(&request.records, Some(window))?;
        let features = self.extractor.extract(&summary.daily)?;
        let analysis = SalesAnalysis { summary, features };

        if let Some(cache) = &self.cache {
            cache.set(key, analysis.clone(), self.config.cache_ttl());
        }
        Ok(analysis)
    }

    /// Forecast with the statistical tiers only; no I/O
    pub fn forecast_statistical(&self, request: &ForecastRequest) -> Result<ForecastOutcome> {
        let days = self.resolve_days(request)?;
        let analysis = self.analyze(request)?;
        let result = self.statistical_result(&request.store_id, &analysis, days)?;
        Ok(self.outcome(result, &analysis))
    }

    /// Forecast with augmentation and persistence
    pub async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastOutcome> {
        let days = self.resolve_days(request)?;
        let analysis = self.analyze(request)?;
        let mut result = self.statistical_result(&request.store_id, &analysis, days)?;

        if result.algorithm_used == ForecastTier::Ensemble {
            if let Some(augmenter) = &self.augmenter {
                match self.augment(augmenter.as_ref(), &result, &analysis, days).await {
                    Ok(augmented) => {
                        info!(store_id = %request.store_id, "using augmented forecast");
                        result = augmented;
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            store_id = %request.store_id,
                            "augmentation discarded, keeping ensemble forecast"
                        );
                    }
                }
            }
        }

        let outcome = self.outcome(result, &analysis);
        self.persist(&outcome).await;
        Ok(outcome)
    }

    fn resolve_days(&self, request: &ForecastRequest) -> Result<usize> {
        let days = request
            .forecast_days
            .unwrap_or(self.config.default_forecast_days);
        if days == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast_days must be at least 1".to_string(),
            ));
        }
        Ok(days)
    }

    /// History window: up to `lookback_days` ending at `as_of`, never before the first record
    fn resolve_window(&self, request: &ForecastRequest) -> Result<LookbackWindow> {
        let spanning = LookbackWindow::spanning(&request.records)
            .ok_or_else(|| ForecastError::NoData("no sales records supplied".to_string()))?;
        let end = request.as_of.unwrap_or_else(|| spanning.end());

        let start = match self.config.lookback_days {
            Some(days) => LookbackWindow::last_days(end, days)?.start().max(spanning.start()),
            None => spanning.start(),
        };
        if start > end {
            return Err(ForecastError::NoData(format!(
                "no sales on or before {}",
                end
            )));
        }
        LookbackWindow::new(start, end)
    }

    fn statistical_result(
        &self,
        store_id: &str,
        analysis: &SalesAnalysis,
        days: usize,
    ) -> Result<ForecastResult> {
        let first_date = first_forecast_date(analysis)?;

        match self.ensemble_result(store_id, analysis, days, first_date) {
            Ok(result) => {
                debug!(store_id, confidence = result.model_confidence, "ensemble forecast built");
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, store_id, "ensemble failed, falling back to naive average");
                self.naive_result(store_id, analysis, days, first_date)
            }
        }
    }

    fn ensemble_result(
        &self,
        store_id: &str,
        analysis: &SalesAnalysis,
        days: usize,
        first_date: NaiveDate,
    ) -> Result<ForecastResult> {
        let forecast = self
            .ensemble
            .forecast(&analysis.summary.daily, &analysis.features, days)?;

        let ctx = InsightContext {
            features: &analysis.features,
            points: &forecast.points,
            seasonal: &forecast.seasonal_components,
            metrics: &forecast.accuracy_metrics,
            weights: &forecast.weights,
            tier: ForecastTier::Ensemble,
            confidence: forecast.model_confidence,
        };
        let insights = derive_insights(&ctx);
        let advanced = derive_advanced_metrics(&ctx);

        ForecastResultBuilder::new(store_id, ForecastTier::Ensemble)
            .model_confidence(forecast.model_confidence)
            .accuracy_metrics(forecast.accuracy_metrics)
            .seasonal_components(forecast.seasonal_components)
            .insights(insights)
            .advanced_metrics(Some(advanced))
            .points(forecast.points)
            .build(days, first_date)
    }

    fn naive_result(
        &self,
        store_id: &str,
        analysis: &SalesAnalysis,
        days: usize,
        first_date: NaiveDate,
    ) -> Result<ForecastResult> {
        let daily = &analysis.summary.daily;
        let average = mean(&sales_values(daily));
        let transactions = mean(&transaction_values(daily)).round().max(0.0) as u64;
        let fraction = self.config.naive_interval_fraction;
        let interval =
            ConfidenceInterval::new(average * (1.0 - fraction), average * (1.0 + fraction));

        let points: Vec<ForecastPoint> = future_dates(analysis.summary.window.end(), days)?
            .into_iter()
            .map(|date| ForecastPoint::new(date, average, transactions, interval))
            .collect();

        let seasonal = SeasonalComponents {
            trend: normalized_trend(analysis.features.slope(), analysis.features.mean()),
            seasonal_strength: 0.0,
            cycle_length_days: self.config.default_cycle_length,
        };
        let metrics = AccuracyMetrics::unavailable();
        let confidence = self.config.naive_confidence;
        let ctx = InsightContext {
            features: &analysis.features,
            points: &points,
            seasonal: &seasonal,
            metrics: &metrics,
            weights: &[],
            tier: ForecastTier::Naive,
            confidence,
        };
        let insights = derive_insights(&ctx);
        let advanced = derive_advanced_metrics(&ctx);

        ForecastResultBuilder::new(store_id, ForecastTier::Naive)
            .model_confidence(confidence)
            .accuracy_metrics(metrics)
            .seasonal_components(seasonal)
            .insights(insights)
            .advanced_metrics(Some(advanced))
            .points(points)
            .build(days, first_date)
    }

    async fn augment(
        &self,
        augmenter: &dyn ForecastAugmenter,
        ensemble: &ForecastResult,
        analysis: &SalesAnalysis,
        days: usize,
    ) -> Result<ForecastResult> {
        let request = AugmentationRequest {
            store_id: ensemble.store_id.clone(),
            forecast_days: days,
            ensemble: ensemble.clone(),
            features: FeatureSummary::new(&analysis.features, ensemble),
        };

        let timeout = self.config.augmentation_timeout();
        let response = tokio::time::timeout(timeout, augmenter.augment(&request))
            .await
            .map_err(|_| AugmentationError::Timeout(self.config.augmentation_timeout_ms))??;

        parse_augmented(response, ensemble, days)
    }

    fn outcome(&self, result: ForecastResult, analysis: &SalesAnalysis) -> ForecastOutcome {
        let today = self.today();

        ForecastOutcome {
            tier: result.algorithm_used,
            accuracy_records: AccuracyRecord::issue_for(&result),
            alerts: self
                .alerts
                .generate(&result, &analysis.summary.daily, today),
            result,
        }
    }

    async fn persist(&self, outcome: &ForecastOutcome) {
        let Some(store) = &self.store else {
            return;
        };
        let forecast_id = outcome.result.forecast_id;

        if let Err(e) = store.save_forecast(&outcome.result).await {
            warn!(error = %e, %forecast_id, "failed to persist forecast");
        }
        if let Err(e) = store.save_accuracy_records(&outcome.accuracy_records).await {
            warn!(error = %e, %forecast_id, "failed to persist accuracy records");
        }
        if let Err(e) = store.save_alerts(&outcome.alerts).await {
            warn!(error = %e, %forecast_id, "failed to persist alerts");
        }
    }
}

/// The day after the last history day
fn first_forecast_date(analysis: &SalesAnalysis) -> Result<NaiveDate> {
    analysis
        .summary
        .window
        .end()
        .succ_opt()
        .ok_or_else(|| {
            ForecastError::InvalidParameter(
                "history ends at the last representable date".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn records(values: &[f64]) -> Vec<RawSaleRecord> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| RawSaleRecord::new(start + chrono::Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_zero_days_is_rejected() {
        let controller = ForecastController::new(ForecastConfig::default()).unwrap();
        let request = ForecastRequest::new("s", records(&[10.0; 14])).with_days(0);
        let err = controller.forecast_statistical(&request).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));
    }

    #[test]
    fn test_window_respects_lookback_and_as_of() {
        let config = ForecastConfig {
            lookback_days: Some(10),
            ..ForecastConfig::default()
        };
        let controller = ForecastController::new(config).unwrap();
        let request = ForecastRequest::new("s", records(&[10.0; 30]))
            .with_as_of(NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
        let window = controller.resolve_window(&request).unwrap();

        assert_eq!(window.start(), NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(window.day_count(), 10);
    }

    #[test]
    fn test_short_history_uses_naive_tier() {
        let controller = ForecastController::new(ForecastConfig::default()).unwrap();
        let request = ForecastRequest::new("s", records(&[50.0; 8])).with_days(2);
        let outcome = controller.forecast_statistical(&request).unwrap();

        assert_eq!(outcome.tier, ForecastTier::Naive);
        assert_eq!(outcome.accuracy_records.len(), 2);
    }
}
