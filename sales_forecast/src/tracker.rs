//! Post-hoc accuracy tracking of issued forecasts
//!
//! Every forecast point gets an [`AccuracyRecord`] when the forecast is
//! issued. Once its date has passed, [`AccuracyTracker::sweep`] fills in the
//! realized sales exactly once.

use crate::aggregate::daily_total;
use crate::data::DailySeriesPoint;
use crate::error::Result;
use crate::result::ForecastResult;
use crate::store::ForecastStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prediction for one day and, once known, how it compared to reality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyRecord {
    pub id: Uuid,
    pub forecast_id: Uuid,
    pub store_id: String,
    pub forecast_date: NaiveDate,
    pub predicted_sales: f64,
    pub predicted_transactions: u64,
    pub actual_sales: Option<f64>,
    pub actual_transactions: Option<u64>,
    pub absolute_error: Option<f64>,
    /// (predicted − actual) / actual × 100, `None` when actual is 0
    pub percentage_error: Option<f64>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl AccuracyRecord {
    /// One unevaluated record per point of `result`
    pub fn issue_for(result: &ForecastResult) -> Vec<Self> {
        result
            .forecasts
            .iter()
            .map(|point| Self {
                id: Uuid::new_v4(),
                forecast_id: result.forecast_id,
                store_id: result.store_id.clone(),
                forecast_date: point.date,
                predicted_sales: point.predicted_sales,
                predicted_transactions: point.predicted_transactions,
                actual_sales: None,
                actual_transactions: None,
                absolute_error: None,
                percentage_error: None,
                evaluated_at: None,
            })
            .collect()
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated_at.is_some()
    }

    /// Whether the record's date lies strictly before `now`'s UTC day
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.forecast_date < now.date_naive()
    }

    /// Fill in an evaluation
    pub fn apply(&mut self, evaluation: &Evaluation) {
        self.actual_sales = Some(evaluation.actual_sales);
        self.actual_transactions = Some(evaluation.actual_transactions);
        self.absolute_error = Some(evaluation.absolute_error);
        self.percentage_error = evaluation.percentage_error;
        self.evaluated_at = Some(evaluation.evaluated_at);
    }
}

/// Comparison of one prediction with the realized day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub actual_sales: f64,
    pub actual_transactions: u64,
    pub absolute_error: f64,
    pub percentage_error: Option<f64>,
    pub evaluated_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn compute(
        predicted_sales: f64,
        actual: &DailySeriesPoint,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        let actual_sales = actual.total_sales;
        let percentage_error = if actual_sales.abs() > f64::EPSILON {
            Some((predicted_sales - actual_sales) / actual_sales * 100.0)
        } else {
            None
        };

        Self {
            actual_sales,
            actual_transactions: actual.transaction_count,
            absolute_error: (predicted_sales - actual_sales).abs(),
            percentage_error,
            evaluated_at,
        }
    }
}

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Due records looked at
    pub examined: usize,
    /// Records written by this sweep
    pub evaluated: usize,
    /// Records another writer had already evaluated
    pub already_evaluated: usize,
    pub failed: usize,
}

/// Periodic evaluator of pending accuracy records
pub struct AccuracyTracker {
    store: Arc<dyn ForecastStore>,
}

impl AccuracyTracker {
    pub fn new(store: Arc<dyn ForecastStore>) -> Self {
        Self { store }
    }

    /// Evaluate every due, unevaluated record
    ///
    /// Failures of individual records are logged and counted; only a failure
    /// to list pending records aborts the sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let pending = self.store.pending_accuracy_records().await?;
        let mut report = SweepReport::default();

        for record in pending.iter().filter(|r| !r.is_evaluated() && r.is_due(now)) {
            report.examined += 1;

            match self.evaluate(record, now).await {
                Ok(true) => report.evaluated += 1,
                Ok(false) => report.already_evaluated += 1,
                Err(e) => {
                    warn!(
                        error = %e,
                        record_id = %record.id,
                        forecast_date = %record.forecast_date,
                        "failed to evaluate accuracy record"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            evaluated = report.evaluated,
            already_evaluated = report.already_evaluated,
            failed = report.failed,
            "accuracy sweep complete"
        );
        Ok(report)
    }

    async fn evaluate(&self, record: &AccuracyRecord, now: DateTime<Utc>) -> Result<bool> {
        let sales = self
            .store
            .sales_for_day(&record.store_id, record.forecast_date)
            .await?;
        let actual = daily_total(&sales, record.forecast_date);
        let evaluation = Evaluation::compute(record.predicted_sales, &actual, now);

        debug!(
            record_id = %record.id,
            predicted = record.predicted_sales,
            actual = actual.total_sales,
            "evaluating forecast point"
        );
        self.store.record_evaluation(record.id, &evaluation).await
    }

    /// Run [`AccuracyTracker::sweep`] on a fixed interval until the task is aborted
    pub fn spawn_periodic(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                if let Err(e) = self.sweep(Utc::now()).await {
                    warn!(error = %e, "accuracy sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(sales: f64, count: u64) -> DailySeriesPoint {
        DailySeriesPoint::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), sales, count)
    }

    #[test]
    fn test_evaluation_errors() {
        let evaluation = Evaluation::compute(110.0, &point(100.0, 5), Utc::now());
        assert_eq!(evaluation.absolute_error, 10.0);
        assert!((evaluation.percentage_error.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(evaluation.actual_transactions, 5);
    }

    #[test]
    fn test_zero_actual_has_no_percentage_error() {
        let evaluation = Evaluation::compute(42.0, &point(0.0, 0), Utc::now());
        assert_eq!(evaluation.percentage_error, None);
        assert_eq!(evaluation.absolute_error, 42.0);
    }
}
