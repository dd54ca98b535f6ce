//! Narrative insights and derived indicators for a forecast

use crate::calendar::weekday_name;
use crate::ensemble::ModelWeight;
use crate::features::{SeriesFeatures, TrendDirection};
use crate::metrics::AccuracyMetrics;
use crate::result::{AdvancedMetrics, ForecastPoint, ForecastTier, Insights};
use crate::seasonality::SeasonalComponents;
use sales_math::finite_or;

const PEAK_DAY_COUNT: usize = 3;
const HIGH_VOLATILITY: f64 = 0.3;
const LOW_CONFIDENCE: f64 = 0.5;
const SHORT_HISTORY_DAYS: usize = 28;
const STRONG_SEASONALITY: f64 = 0.5;
const NOTABLE_GROWTH_PERCENT: f64 = 5.0;

/// Everything the insight rules look at
#[derive(Debug, Clone, Copy)]
pub struct InsightContext<'a> {
    pub features: &'a SeriesFeatures,
    pub points: &'a [ForecastPoint],
    pub seasonal: &'a SeasonalComponents,
    pub metrics: &'a AccuracyMetrics,
    pub weights: &'a [ModelWeight],
    pub tier: ForecastTier,
    pub confidence: f64,
}

impl InsightContext<'_> {
    /// Forecast average versus historical average, in percent
    pub fn growth_rate(&self) -> f64 {
        let history = self.features.mean();
        if self.points.is_empty() || history.abs() < f64::EPSILON {
            return 0.0;
        }
        let forecast =
            self.points.iter().map(|p| p.predicted_sales).sum::<f64>() / self.points.len() as f64;
        finite_or((forecast - history) / history * 100.0, 0.0)
    }

    /// Names of the strongest weekdays with positive average sales
    pub fn peak_days(&self) -> Vec<String> {
        self.features
            .ranked_weekdays()
            .into_iter()
            .filter(|&day| self.features.weekly_pattern[day] > 0.0)
            .take(PEAK_DAY_COUNT)
            .map(|day| weekday_name(day).to_string())
            .collect()
    }
}

/// Build the insights block for a result
pub fn derive_insights(ctx: &InsightContext<'_>) -> Insights {
    let growth_rate = ctx.growth_rate();
    let peak_days = ctx.peak_days();

    Insights {
        period: period(ctx.points),
        growth_rate,
        seasonality_pattern: seasonality_pattern(ctx.seasonal, peak_days.first()),
        recommended_actions: recommended_actions(ctx, peak_days.first()),
        risk_factors: risk_factors(ctx),
        opportunity_indicators: opportunity_indicators(ctx, growth_rate),
        algorithm_analysis: algorithm_analysis(ctx),
        accuracy_score: ctx.confidence,
        peak_days,
    }
}

/// Volatility, trend fit and seasonality folded into a few indicators
pub fn derive_advanced_metrics(ctx: &InsightContext<'_>) -> AdvancedMetrics {
    let volatility = ctx.features.volatility;
    let growth_component = ((ctx.growth_rate() + 20.0) / 40.0).clamp(0.0, 1.0);
    let stability = 1.0 - volatility.clamp(0.0, 1.0);
    let score = 100.0 * (0.4 * ctx.confidence + 0.3 * stability + 0.3 * growth_component);

    AdvancedMetrics {
        volatility_index: volatility,
        trend_strength: finite_or(ctx.features.trend.r_squared, 0.0).clamp(0.0, 1.0),
        seasonal_factor: ctx.seasonal.seasonal_strength,
        revenue_optimization_score: finite_or(score, 0.0).clamp(0.0, 100.0),
    }
}

fn period(points: &[ForecastPoint]) -> String {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => format!("{} to {}", first.date, last.date),
        _ => String::new(),
    }
}

fn seasonality_pattern(seasonal: &SeasonalComponents, peak: Option<&String>) -> String {
    let cycle = if seasonal.seasonal_strength > 0.0 {
        format!(
            "{}-day cycle (strength {:.2})",
            seasonal.cycle_length_days, seasonal.seasonal_strength
        )
    } else {
        "No significant cycle".to_string()
    };
    match peak {
        Some(day) => format!("{}, strongest on {}", cycle, day),
        None => cycle,
    }
}

fn recommended_actions(ctx: &InsightContext<'_>, peak: Option<&String>) -> Vec<String> {
    let mut actions = Vec::new();
    match ctx.features.trend_direction {
        TrendDirection::Upward => {
            actions.push("Increase inventory ahead of expected growth".to_string())
        }
        TrendDirection::Downward => {
            actions.push("Review pricing and promotions to counter declining sales".to_string())
        }
        TrendDirection::Stable => {
            actions.push("Maintain current staffing and stock levels".to_string())
        }
    }
    if let Some(day) = peak {
        actions.push(format!("Schedule additional staff on {}", day));
    }
    if ctx.features.volatility > HIGH_VOLATILITY {
        actions.push("Hold safety stock to absorb volatile demand".to_string());
    }
    if ctx.confidence < LOW_CONFIDENCE {
        actions.push("Treat this forecast as indicative and collect more history".to_string());
    }
    actions
}

fn risk_factors(ctx: &InsightContext<'_>) -> Vec<String> {
    let mut risks = Vec::new();
    if ctx.features.volatility > HIGH_VOLATILITY {
        risks.push(format!(
            "High day-to-day volatility ({:.0}%)",
            ctx.features.volatility * 100.0
        ));
    }
    if ctx.features.trend_direction == TrendDirection::Downward {
        risks.push(format!(
            "Sales trending downward ({:.2} per day)",
            ctx.features.slope()
        ));
    }
    if ctx.confidence < LOW_CONFIDENCE {
        risks.push(format!("Low model confidence ({:.2})", ctx.confidence));
    }
    if ctx.tier == ForecastTier::Naive {
        risks.push("Statistical models unavailable, historical average used".to_string());
    }
    if ctx.features.observations < SHORT_HISTORY_DAYS {
        risks.push(format!(
            "Limited history ({} days)",
            ctx.features.observations
        ));
    }
    risks
}

fn opportunity_indicators(ctx: &InsightContext<'_>, growth_rate: f64) -> Vec<String> {
    let mut opportunities = Vec::new();
    if ctx.features.trend_direction == TrendDirection::Upward {
        opportunities.push(format!(
            "Sales trending upward ({:.2} per day)",
            ctx.features.slope()
        ));
    }
    if growth_rate > NOTABLE_GROWTH_PERCENT {
        opportunities.push(format!(
            "Forecast exceeds the historical average by {:.1}%",
            growth_rate
        ));
    }
    if ctx.seasonal.seasonal_strength >= STRONG_SEASONALITY {
        opportunities.push(format!(
            "Predictable {}-day cycle can guide promotions",
            ctx.seasonal.cycle_length_days
        ));
    }
    opportunities
}

fn algorithm_analysis(ctx: &InsightContext<'_>) -> String {
    match ctx.tier {
        ForecastTier::Naive => format!(
            "Historical daily average over {} days with a fixed confidence of {:.2}",
            ctx.features.observations, ctx.confidence
        ),
        ForecastTier::Ensemble | ForecastTier::Augmented => {
            let members = ctx
                .weights
                .iter()
                .map(|w| format!("{} {:.0}%", w.model, w.weight * 100.0))
                .collect::<Vec<_>>()
                .join(", ");
            let prefix = if ctx.tier == ForecastTier::Augmented {
                "Augmented weighted ensemble"
            } else {
                "Weighted ensemble"
            };
            format!("{} of {}; backtest {}", prefix, members, ctx.metrics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailySeriesPoint;
    use crate::features::FeatureExtractor;
    use crate::result::ConfidenceInterval;
    use chrono::NaiveDate;

    fn features(values: &[f64]) -> SeriesFeatures {
        let start = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(); // Sunday
        let daily: Vec<DailySeriesPoint> = values
            .iter()
            .enumerate()
            .map(|(i, v)| DailySeriesPoint::new(start + chrono::Duration::days(i as i64), *v, 1))
            .collect();
        FeatureExtractor::default().extract(&daily).unwrap()
    }

    fn points(values: &[f64]) -> Vec<ForecastPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                ForecastPoint::new(
                    start + chrono::Duration::days(i as i64),
                    *v,
                    1,
                    ConfidenceInterval::new(v * 0.9, v * 1.1),
                )
            })
            .collect()
    }

    fn seasonal() -> SeasonalComponents {
        SeasonalComponents {
            trend: 0.0,
            seasonal_strength: 0.0,
            cycle_length_days: 7,
        }
    }

    #[test]
    fn test_growth_rate_and_period() {
        let features = features(&[100.0; 10]);
        let points = points(&[110.0, 110.0]);
        let seasonal = seasonal();
        let metrics = AccuracyMetrics::unavailable();
        let ctx = InsightContext {
            features: &features,
            points: &points,
            seasonal: &seasonal,
            metrics: &metrics,
            weights: &[],
            tier: ForecastTier::Naive,
            confidence: 0.3,
        };
        let insights = derive_insights(&ctx);

        assert!((insights.growth_rate - 10.0).abs() < 1e-9);
        assert_eq!(insights.period, "2024-04-01 to 2024-04-02");
        assert_eq!(insights.accuracy_score, 0.3);
        assert!(insights
            .risk_factors
            .iter()
            .any(|r| r.contains("historical average")));
    }

    #[test]
    fn test_peak_days_follow_weekly_pattern() {
        // Sunday-first week with the peak on Friday then Saturday
        let week = [10.0, 11.0, 12.0, 13.0, 14.0, 40.0, 30.0];
        let values: Vec<f64> = (0..14).map(|i| week[i % 7]).collect();
        let features = features(&values);
        let points = points(&[20.0]);
        let seasonal = seasonal();
        let metrics = AccuracyMetrics::unavailable();
        let ctx = InsightContext {
            features: &features,
            points: &points,
            seasonal: &seasonal,
            metrics: &metrics,
            weights: &[],
            tier: ForecastTier::Ensemble,
            confidence: 0.8,
        };

        assert_eq!(ctx.peak_days(), vec!["Friday", "Saturday", "Thursday"]);
        let advanced = derive_advanced_metrics(&ctx);
        assert!((0.0..=100.0).contains(&advanced.revenue_optimization_score));
    }
}
