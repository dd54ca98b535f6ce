use chrono::{Duration, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use sales_forecast::{
    AccuracyRecord, AccuracyTracker, ConfidenceInterval, DailySeriesPoint, Evaluation,
    ForecastPoint, ForecastResult, ForecastResultBuilder, ForecastStore, ForecastTier,
    InMemoryStore, RawSaleRecord, SweepReport,
};
use std::sync::Arc;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

fn issued_forecast() -> ForecastResult {
    let points = (1..=3)
        .map(|d| ForecastPoint::new(day(d), 100.0, 10, ConfidenceInterval::new(80.0, 120.0)))
        .collect();
    ForecastResultBuilder::new("store-7", ForecastTier::Ensemble)
        .points(points)
        .model_confidence(0.7)
        .build(3, day(1))
        .unwrap()
}

fn issued_records() -> Vec<AccuracyRecord> {
    AccuracyRecord::issue_for(&issued_forecast())
}

async fn seeded_store() -> Arc<InMemoryStore> {
    store_with(issued_records()).await
}

async fn store_with(records: Vec<AccuracyRecord>) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.save_accuracy_records(&records).await.unwrap();

    // Two sales on April 1st, one on the 2nd, nothing on the 3rd
    let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).unwrap();
    store
        .add_sales(
            "store-7",
            vec![
                RawSaleRecord::new(at(1, 9), 50.0),
                RawSaleRecord::new(at(1, 15), 30.0),
                RawSaleRecord::new(at(2, 11), 125.0),
            ],
        )
        .await;
    store
}

#[test]
fn test_records_are_issued_per_point() {
    let records = issued_records();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| !r.is_evaluated()));
    assert!(records.iter().all(|r| r.store_id == "store-7"));
    assert_eq!(records[2].forecast_date, day(3));
}

#[tokio::test]
async fn test_sweep_evaluates_elapsed_days() {
    let store = seeded_store().await;
    let tracker = AccuracyTracker::new(store.clone());
    let now = Utc.with_ymd_and_hms(2024, 4, 4, 0, 30, 0).unwrap();

    let report = tracker.sweep(now).await.unwrap();
    assert_eq!(
        report,
        SweepReport {
            examined: 3,
            evaluated: 3,
            already_evaluated: 0,
            failed: 0,
        }
    );

    let records = store.accuracy_records().await;
    let first = &records[0];
    assert_eq!(first.actual_sales, Some(80.0));
    assert_eq!(first.actual_transactions, Some(2));
    assert_eq!(first.absolute_error, Some(20.0));
    assert!((first.percentage_error.unwrap() - 25.0).abs() < 1e-9);

    let second = &records[1];
    assert!((second.percentage_error.unwrap() + 20.0).abs() < 1e-9);

    // No sales on the 3rd
    let third = &records[2];
    assert_eq!(third.actual_sales, Some(0.0));
    assert_eq!(third.percentage_error, None);
    assert_eq!(third.absolute_error, Some(third.predicted_sales));
}

#[tokio::test]
async fn test_sweep_attaches_actuals_to_the_stored_forecast() {
    let forecast = issued_forecast();
    let store = store_with(AccuracyRecord::issue_for(&forecast)).await;
    store.save_forecast(&forecast).await.unwrap();

    let tracker = AccuracyTracker::new(store.clone());
    // Only April 1st and 2nd have elapsed
    let now = Utc.with_ymd_and_hms(2024, 4, 3, 8, 0, 0).unwrap();
    tracker.sweep(now).await.unwrap();

    let stored = store.forecast(forecast.forecast_id).await.unwrap();
    let actuals: Vec<(Option<f64>, Option<u64>)> = stored
        .forecasts
        .iter()
        .map(|p| (p.actual_sales, p.actual_transactions))
        .collect();
    assert_eq!(
        actuals,
        vec![(Some(80.0), Some(2)), (Some(125.0), Some(1)), (None, None)]
    );
    assert_eq!(stored.forecasts[0].predicted_sales, 100.0);
}

#[tokio::test]
async fn test_sweep_skips_days_not_yet_over() {
    let store = seeded_store().await;
    let tracker = AccuracyTracker::new(store.clone());
    // Still April 2nd: only the 1st has fully elapsed
    let now = Utc.with_ymd_and_hms(2024, 4, 2, 23, 0, 0).unwrap();

    let report = tracker.sweep(now).await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.evaluated, 1);
    assert_eq!(store.pending_accuracy_records().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_second_sweep_is_a_no_op() {
    let store = seeded_store().await;
    let tracker = AccuracyTracker::new(store.clone());
    let now = Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap();

    tracker.sweep(now).await.unwrap();
    let before = store.accuracy_records().await;

    let report = tracker.sweep(now + Duration::days(1)).await.unwrap();
    assert_eq!(report.examined, 0);
    assert_eq!(report.evaluated, 0);
    assert_eq!(store.accuracy_records().await, before);
}

#[tokio::test]
async fn test_periodic_sweep_evaluates_in_background() {
    let store = seeded_store().await;
    let tracker = Arc::new(AccuracyTracker::new(store.clone()));

    // Real time is well past April 2024, so every record is due
    let handle = tracker.spawn_periodic(std::time::Duration::from_millis(10));
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    handle.abort();

    assert!(store.pending_accuracy_records().await.unwrap().is_empty());
    assert!(store
        .accuracy_records()
        .await
        .iter()
        .all(|r| r.is_evaluated()));
}

#[tokio::test]
async fn test_record_evaluation_is_compare_and_set() {
    let store = seeded_store().await;
    let record = store.pending_accuracy_records().await.unwrap().remove(0);
    let actual = DailySeriesPoint::new(record.forecast_date, 90.0, 3);
    let evaluation = Evaluation::compute(record.predicted_sales, &actual, Utc::now());

    assert!(store.record_evaluation(record.id, &evaluation).await.unwrap());
    assert!(!store.record_evaluation(record.id, &evaluation).await.unwrap());
}
