//! Feature extraction from a daily sales series

use crate::aggregate::{monthly_trend, seasonal_totals, weekly_pattern};
use crate::data::{sales_values, DailySeriesPoint};
use crate::error::{ForecastError, Result};
use sales_math::descriptive::coefficient_of_variation;
use sales_math::{LinearFit, Moments, Percentiles};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of the fitted sales trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

impl TrendDirection {
    /// Classify a slope against an absolute threshold
    pub fn classify(slope: f64, threshold: f64) -> Self {
        if slope > threshold {
            TrendDirection::Upward
        } else if slope < -threshold {
            TrendDirection::Downward
        } else {
            TrendDirection::Stable
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendDirection::Upward => "upward",
            TrendDirection::Downward => "downward",
            TrendDirection::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Statistical description of a daily sales series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesFeatures {
    pub trend: LinearFit,
    pub trend_direction: TrendDirection,
    /// Coefficient of variation of daily sales
    pub volatility: f64,
    pub moments: Moments,
    pub percentiles: Percentiles,
    /// Average sales per weekday, Sunday first
    pub weekly_pattern: [f64; 7],
    /// Sales per calendar month, oldest first
    pub monthly_trend: Vec<f64>,
    /// Sales per season: winter, spring, summer, autumn
    pub seasonal_buckets: [f64; 4],
    /// Number of days described
    pub observations: usize,
}

impl SeriesFeatures {
    pub fn slope(&self) -> f64 {
        self.trend.slope
    }

    pub fn mean(&self) -> f64 {
        self.moments.mean
    }

    /// Weekday indices ordered from strongest to weakest average sales
    pub fn ranked_weekdays(&self) -> Vec<usize> {
        let mut days: Vec<usize> = (0..7).collect();
        days.sort_by(|&a, &b| self.weekly_pattern[b].total_cmp(&self.weekly_pattern[a]));
        days
    }
}

/// Computes [`SeriesFeatures`]
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    trend_threshold: f64,
    min_days: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            trend_threshold: 1.0,
            min_days: 7,
        }
    }
}

impl FeatureExtractor {
    pub fn new(trend_threshold: f64, min_days: usize) -> Self {
        Self {
            trend_threshold,
            min_days,
        }
    }

    pub fn extract(&self, daily: &[DailySeriesPoint]) -> Result<SeriesFeatures> {
        if daily.len() < self.min_days {
            return Err(ForecastError::InsufficientData {
                found: daily.len(),
                required: self.min_days,
            });
        }

        let values = sales_values(daily);
        let trend = LinearFit::fit(&values)?;

        let mut weekly = [0.0; 7];
        for stats in weekly_pattern(daily) {
            weekly[stats.weekday] = stats.average_sales;
        }

        Ok(SeriesFeatures {
            trend_direction: TrendDirection::classify(trend.slope, self.trend_threshold),
            trend,
            volatility: coefficient_of_variation(&values),
            moments: Moments::of(&values)?,
            percentiles: Percentiles::of(&values)?,
            weekly_pattern: weekly,
            monthly_trend: monthly_trend(daily).iter().map(|m| m.total_sales).collect(),
            seasonal_buckets: seasonal_totals(daily).as_array(),
            observations: daily.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.5, TrendDirection::Upward)]
    #[case(1.0, TrendDirection::Stable)]
    #[case(-1.0, TrendDirection::Stable)]
    #[case(-1.01, TrendDirection::Downward)]
    fn test_classify_uses_absolute_threshold(#[case] slope: f64, #[case] expected: TrendDirection) {
        assert_eq!(TrendDirection::classify(slope, 1.0), expected);
    }

    #[test]
    fn test_display() {
        assert_eq!(TrendDirection::Upward.to_string(), "upward");
    }
}
