//! Threshold alerts derived from a forecast

use crate::config::AlertPolicy;
use crate::data::{sales_values, DailySeriesPoint};
use crate::result::ForecastResult;
use chrono::NaiveDate;
use sales_math::descriptive::mean;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Opportunity,
    Warning,
    Trend,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AlertType::Opportunity => "opportunity",
            AlertType::Warning => "warning",
            AlertType::Trend => "trend",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A notice raised for one forecast day
///
/// Only `dismissed` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub forecast_id: Uuid,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub forecast_date: NaiveDate,
    pub predicted_value: f64,
    pub threshold_value: Option<f64>,
    pub confidence_score: f64,
    pub message: String,
    pub dismissed: bool,
}

impl Alert {
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

/// Alerts that have not been dismissed
pub fn active_alerts(alerts: &[Alert]) -> Vec<&Alert> {
    alerts.iter().filter(|a| !a.dismissed).collect()
}

/// Applies an [`AlertPolicy`] to forecast results
#[derive(Debug, Clone, Default)]
pub struct AlertGenerator {
    policy: AlertPolicy,
}

impl AlertGenerator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Mean of the trailing baseline window, or of the forecast when there is no history
    pub fn baseline(&self, result: &ForecastResult, history: &[DailySeriesPoint]) -> f64 {
        if history.is_empty() {
            let predicted: Vec<f64> = result.forecasts.iter().map(|p| p.predicted_sales).collect();
            return mean(&predicted);
        }
        let start = history.len().saturating_sub(self.policy.baseline_window_days.max(1));
        mean(&sales_values(&history[start..]))
    }

    /// Alerts for every forecast day on or after `today`
    pub fn generate(
        &self,
        result: &ForecastResult,
        history: &[DailySeriesPoint],
        today: NaiveDate,
    ) -> Vec<Alert> {
        let baseline = self.baseline(result, history);
        let mut alerts = Vec::new();
        let eligible: Vec<_> = result.forecasts.iter().filter(|p| p.date >= today).collect();

        if baseline > 0.0 {
            let floor = baseline * (1.0 - self.policy.warning_drop);
            let ceiling = baseline * (1.0 + self.policy.opportunity_rise);

            for point in &eligible {
                let predicted = point.predicted_sales;
                let deviation = (predicted - baseline) / baseline;

                let (alert_type, threshold, message) = if predicted < floor {
                    (
                        AlertType::Warning,
                        floor,
                        format!(
                            "Sales on {} forecast at {:.2}, {:.0}% below the recent average of {:.2}",
                            point.date,
                            predicted,
                            -deviation * 100.0,
                            baseline
                        ),
                    )
                } else if predicted > ceiling {
                    (
                        AlertType::Opportunity,
                        ceiling,
                        format!(
                            "Sales on {} forecast at {:.2}, {:.0}% above the recent average of {:.2}",
                            point.date,
                            predicted,
                            deviation * 100.0,
                            baseline
                        ),
                    )
                } else {
                    continue;
                };

                alerts.push(self.alert(
                    result,
                    alert_type,
                    self.severity(deviation.abs()),
                    point.date,
                    predicted,
                    Some(threshold),
                    message,
                ));
            }
        }

        if let Some(first) = eligible.first() {
            if let Some(alert) = self.trend_alert(result, first.date, first.predicted_sales) {
                alerts.push(alert);
            }
        }

        alerts
    }

    /// Severity for a relative deviation from the baseline
    pub fn severity(&self, deviation: f64) -> Severity {
        if deviation >= self.policy.high_deviation {
            Severity::High
        } else if deviation >= self.policy.medium_deviation {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    fn trend_alert(&self, result: &ForecastResult, date: NaiveDate, predicted: f64) -> Option<Alert> {
        let components = &result.seasonal_components;
        let trend = components.trend;

        if trend.abs() >= self.policy.trend_alert_threshold {
            let direction = if trend > 0.0 { "rising" } else { "falling" };
            let severity = if trend.abs() >= 2.0 * self.policy.trend_alert_threshold {
                Severity::High
            } else {
                Severity::Medium
            };
            return Some(self.alert(
                result,
                AlertType::Trend,
                severity,
                date,
                predicted,
                Some(self.policy.trend_alert_threshold),
                format!(
                    "Sales are {} by {:.1}% of the average per day",
                    direction,
                    trend.abs() * 100.0
                ),
            ));
        }

        if components.seasonal_strength >= self.policy.seasonal_alert_threshold {
            return Some(self.alert(
                result,
                AlertType::Trend,
                Severity::Low,
                date,
                predicted,
                Some(self.policy.seasonal_alert_threshold),
                format!(
                    "Strong {}-day sales cycle (strength {:.2})",
                    components.cycle_length_days, components.seasonal_strength
                ),
            ));
        }

        None
    }

    #[allow(clippy::too_many_arguments)]
    fn alert(
        &self,
        result: &ForecastResult,
        alert_type: AlertType,
        severity: Severity,
        forecast_date: NaiveDate,
        predicted_value: f64,
        threshold_value: Option<f64>,
        message: String,
    ) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            forecast_id: result.forecast_id,
            alert_type,
            severity,
            forecast_date,
            predicted_value,
            threshold_value,
            confidence_score: result.model_confidence,
            message,
            dismissed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.1, Severity::Low)]
    #[case(0.25, Severity::Medium)]
    #[case(0.39, Severity::Medium)]
    #[case(0.4, Severity::High)]
    fn test_severity(#[case] deviation: f64, #[case] expected: Severity) {
        assert_eq!(AlertGenerator::default().severity(deviation), expected);
    }

    #[test]
    fn test_dismissed_alerts_are_not_active() {
        let mut alert = Alert {
            id: Uuid::new_v4(),
            forecast_id: Uuid::new_v4(),
            alert_type: AlertType::Warning,
            severity: Severity::Low,
            forecast_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            predicted_value: 1.0,
            threshold_value: None,
            confidence_score: 0.5,
            message: String::new(),
            dismissed: false,
        };
        let other = alert.clone();
        alert.dismiss();

        let alerts = vec![alert, other];
        assert_eq!(active_alerts(&alerts).len(), 1);
    }
}
