//! Persistence boundary for forecasts, accuracy records and alerts

use crate::alerts::Alert;
use crate::data::RawSaleRecord;
use crate::error::{ForecastError, Result};
use crate::result::ForecastResult;
use crate::tracker::{AccuracyRecord, Evaluation};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Storage collaborator
///
/// Forecast-side writes are best-effort from the controller's point of view.
/// `record_evaluation` must only write a record that has not been evaluated
/// yet and report whether it did.
#[async_trait]
pub trait ForecastStore: Send + Sync {
    async fn save_forecast(&self, result: &ForecastResult) -> Result<()>;

    async fn save_accuracy_records(&self, records: &[AccuracyRecord]) -> Result<()>;

    async fn save_alerts(&self, alerts: &[Alert]) -> Result<()>;

    /// Records without an evaluation
    async fn pending_accuracy_records(&self) -> Result<Vec<AccuracyRecord>>;

    /// Raw sales of `store_id` on `date`
    async fn sales_for_day(&self, store_id: &str, date: NaiveDate) -> Result<Vec<RawSaleRecord>>;

    /// Compare-and-set: write `evaluation` only if the record is still unevaluated
    ///
    /// On a successful write the realized values are also attached to the
    /// matching point of the stored forecast.
    async fn record_evaluation(&self, record_id: Uuid, evaluation: &Evaluation) -> Result<bool>;
}

#[derive(Debug, Default)]
struct Tables {
    forecasts: HashMap<Uuid, ForecastResult>,
    accuracy: HashMap<Uuid, AccuracyRecord>,
    alerts: Vec<Alert>,
    sales: HashMap<String, Vec<RawSaleRecord>>,
}

/// [`ForecastStore`] kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register realized sales for a store
    pub async fn add_sales(
        &self,
        store_id: &str,
        records: impl IntoIterator<Item = RawSaleRecord>,
    ) {
        let mut tables = self.tables.write().await;
        tables
            .sales
            .entry(store_id.to_string())
            .or_default()
            .extend(records);
    }

    pub async fn forecast(&self, id: Uuid) -> Option<ForecastResult> {
        self.tables.read().await.forecasts.get(&id).cloned()
    }

    pub async fn accuracy_records(&self) -> Vec<AccuracyRecord> {
        let tables = self.tables.read().await;
        let mut records: Vec<AccuracyRecord> = tables.accuracy.values().cloned().collect();
        records.sort_by_key(|r| (r.forecast_date, r.id));
        records
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.tables.read().await.alerts.clone()
    }
}

#[async_trait]
impl ForecastStore for InMemoryStore {
    async fn save_forecast(&self, result: &ForecastResult) -> Result<()> {
        self.tables
            .write()
            .await
            .forecasts
            .insert(result.forecast_id, result.clone());
        Ok(())
    }

    async fn save_accuracy_records(&self, records: &[AccuracyRecord]) -> Result<()> {
        let mut tables = self.tables.write().await;
        for record in records {
            if tables.accuracy.contains_key(&record.id) {
                return Err(ForecastError::Persistence(format!(
                    "accuracy record {} already exists",
                    record.id
                )));
            }
            tables.accuracy.insert(record.id, record.clone());
        }
        Ok(())
    }

    async fn save_alerts(&self, alerts: &[Alert]) -> Result<()> {
        self.tables.write().await.alerts.extend_from_slice(alerts);
        Ok(())
    }

    async fn pending_accuracy_records(&self) -> Result<Vec<AccuracyRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accuracy
            .values()
            .filter(|r| !r.is_evaluated())
            .cloned()
            .collect())
    }

    async fn sales_for_day(&self, store_id: &str, date: NaiveDate) -> Result<Vec<RawSaleRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sales
            .get(store_id)
            .map(|records| records.iter().filter(|r| r.day() == date).cloned().collect())
            .unwrap_or_default())
    }

    async fn record_evaluation(&self, record_id: Uuid, evaluation: &Evaluation) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let record = tables.accuracy.get_mut(&record_id).ok_or_else(|| {
            ForecastError::Persistence(format!("unknown accuracy record {}", record_id))
        })?;
        if record.is_evaluated() {
            return Ok(false);
        }
        record.apply(evaluation);
        let (forecast_id, date) = (record.forecast_id, record.forecast_date);

        if let Some(point) = tables
            .forecasts
            .get_mut(&forecast_id)
            .and_then(|f| f.forecasts.iter_mut().find(|p| p.date == date))
        {
            point.actual_sales = Some(evaluation.actual_sales);
            point.actual_transactions = Some(evaluation.actual_transactions);
        }
        Ok(true)
    }
}
