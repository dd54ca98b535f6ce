//! Daily, weekly, monthly and seasonal aggregation of raw sales
//!
//! Grouping always happens on the UTC calendar day of each record.

use crate::calendar::{season_for_month, weekday_index, weekday_name, Season};
use crate::data::{DailySeriesPoint, RawSaleRecord};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Number of products kept in the performance ranking
pub const TOP_PRODUCT_LIMIT: usize = 20;

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl LookbackWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ForecastError::InvalidParameter(format!(
                "Window start {} is after its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at (and including) `end`
    pub fn last_days(end: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(ForecastError::InvalidParameter(
                "Lookback must cover at least one day".to_string(),
            ));
        }
        let start = end
            .checked_sub_signed(Duration::days(days as i64 - 1))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!("Lookback of {} days underflows", days))
            })?;
        Self::new(start, end)
    }

    /// Window from the earliest to the latest record day
    pub fn spanning(records: &[RawSaleRecord]) -> Option<Self> {
        let start = records.iter().map(RawSaleRecord::day).min()?;
        let end = records.iter().map(RawSaleRecord::day).max()?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days in the window
    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.day_count())
    }
}

/// Average sales and transactions for one weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayStats {
    /// 0 = Sunday … 6 = Saturday
    pub weekday: usize,
    pub name: String,
    pub average_sales: f64,
    pub average_transactions: f64,
    /// Days of this weekday in the series
    pub days: usize,
}

/// Sales summed over one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub total_sales: f64,
    pub transaction_count: u64,
}

/// Sales summed per season, indexed like [`Season::ALL`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTotals {
    pub winter: f64,
    pub spring: f64,
    pub summer: f64,
    pub autumn: f64,
}

impl SeasonalTotals {
    pub fn get(&self, season: Season) -> f64 {
        match season {
            Season::Winter => self.winter,
            Season::Spring => self.spring,
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
        }
    }

    fn add(&mut self, season: Season, amount: f64) {
        match season {
            Season::Winter => self.winter += amount,
            Season::Spring => self.spring += amount,
            Season::Summer => self.summer += amount,
            Season::Autumn => self.autumn += amount,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.winter, self.spring, self.summer, self.autumn]
    }
}

/// Revenue contribution of one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_id: String,
    pub revenue: f64,
    pub quantity: f64,
    /// Records containing the product
    pub transaction_count: u64,
    /// revenue × (transaction_count / total transactions)
    pub performance_score: f64,
}

/// Everything the aggregator derives from one batch of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub window: LookbackWindow,
    pub daily: Vec<DailySeriesPoint>,
    /// Days that carried at least one record
    pub active_days: usize,
    pub weekly_pattern: Vec<WeekdayStats>,
    pub monthly_trend: Vec<MonthlyTotal>,
    pub seasonal_totals: SeasonalTotals,
    pub top_products: Vec<ProductPerformance>,
}

/// Groups raw records into daily series and summaries
#[derive(Debug, Clone)]
pub struct Aggregator {
    min_days: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self { min_days: 7 }
    }
}

impl Aggregator {
    pub fn new(min_days: usize) -> Self {
        Self { min_days }
    }

    pub fn min_days(&self) -> usize {
        self.min_days
    }

    /// Build the full summary for `records` restricted to `window`
    ///
    /// Without a window the summary spans the earliest to latest record.
    pub fn summarize(
        &self,
        records: &[RawSaleRecord],
        window: Option<LookbackWindow>,
    ) -> Result<SalesSummary> {
        let window = match window.or_else(|| LookbackWindow::spanning(records)) {
            Some(w) => w,
            None => return Err(ForecastError::NoData("no sales records supplied".to_string())),
        };

        let in_window: Vec<&RawSaleRecord> = records
            .iter()
            .filter(|r| window.contains(r.day()))
            .collect();
        for record in &in_window {
            record.validate()?;
        }

        let (daily, active_days) = daily_series(&in_window, window);
        if active_days == 0 {
            return Err(ForecastError::NoData(format!(
                "no sales between {} and {}",
                window.start(),
                window.end()
            )));
        }
        if active_days < self.min_days {
            return Err(ForecastError::InsufficientData {
                found: active_days,
                required: self.min_days,
            });
        }

        debug!(
            records = in_window.len(),
            days = daily.len(),
            active_days,
            "aggregated daily sales"
        );

        Ok(SalesSummary {
            window,
            weekly_pattern: weekly_pattern(&daily),
            monthly_trend: monthly_trend(&daily),
            seasonal_totals: seasonal_totals(&daily),
            top_products: product_rankings(&in_window),
            daily,
            active_days,
        })
    }

    /// Daily series only, with the same validation as [`Aggregator::summarize`]
    pub fn daily(
        &self,
        records: &[RawSaleRecord],
        window: Option<LookbackWindow>,
    ) -> Result<Vec<DailySeriesPoint>> {
        self.summarize(records, window).map(|s| s.daily)
    }
}

/// One zero-filled entry per day of `window`, plus the count of days with sales
fn daily_series(records: &[&RawSaleRecord], window: LookbackWindow) -> (Vec<DailySeriesPoint>, usize) {
    let mut by_day: HashMap<NaiveDate, (f64, u64)> = HashMap::new();
    for record in records {
        let entry = by_day.entry(record.day()).or_insert((0.0, 0));
        entry.0 += record.total;
        entry.1 += 1;
    }

    let active_days = by_day.len();
    let daily = window
        .days()
        .map(|date| match by_day.get(&date) {
            Some(&(total, count)) => DailySeriesPoint::new(date, total, count),
            None => DailySeriesPoint::empty(date),
        })
        .collect();

    (daily, active_days)
}

/// Realized aggregate of a single day
pub fn daily_total(records: &[RawSaleRecord], date: NaiveDate) -> DailySeriesPoint {
    records
        .iter()
        .filter(|r| r.day() == date)
        .fold(DailySeriesPoint::empty(date), |mut point, record| {
            point.total_sales += record.total;
            point.transaction_count += 1;
            point
        })
}

/// Average sales and transactions per weekday, Sunday first
pub fn weekly_pattern(daily: &[DailySeriesPoint]) -> Vec<WeekdayStats> {
    let mut sums = [(0.0_f64, 0.0_f64, 0_usize); 7];
    for point in daily {
        let slot = &mut sums[weekday_index(point.date)];
        slot.0 += point.total_sales;
        slot.1 += point.transaction_count as f64;
        slot.2 += 1;
    }

    sums.iter()
        .enumerate()
        .map(|(weekday, &(sales, transactions, days))| {
            let divisor = days.max(1) as f64;
            WeekdayStats {
                weekday,
                name: weekday_name(weekday).to_string(),
                average_sales: sales / divisor,
                average_transactions: transactions / divisor,
                days,
            }
        })
        .collect()
}

/// Sales per calendar month in ascending order
pub fn monthly_trend(daily: &[DailySeriesPoint]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<(i32, u32), (f64, u64)> = BTreeMap::new();
    for point in daily {
        let entry = months
            .entry((point.date.year(), point.date.month()))
            .or_insert((0.0, 0));
        entry.0 += point.total_sales;
        entry.1 += point.transaction_count;
    }

    months
        .into_iter()
        .map(|((year, month), (total_sales, transaction_count))| MonthlyTotal {
            year,
            month,
            total_sales,
            transaction_count,
        })
        .collect()
}

/// Sales per season
pub fn seasonal_totals(daily: &[DailySeriesPoint]) -> SeasonalTotals {
    let mut totals = SeasonalTotals::default();
    for point in daily {
        totals.add(season_for_month(point.date.month()), point.total_sales);
    }
    totals
}

/// Products ranked by performance score, best first, at most [`TOP_PRODUCT_LIMIT`]
pub fn product_rankings(records: &[&RawSaleRecord]) -> Vec<ProductPerformance> {
    let total_transactions = records.len();
    if total_transactions == 0 {
        return Vec::new();
    }

    // Insertion order keeps the ranking stable for equal scores.
    let mut order: Vec<String> = Vec::new();
    let mut stats: HashMap<String, (f64, f64, u64)> = HashMap::new();
    for record in records {
        let mut seen: HashSet<&str> = HashSet::new();
        for item in &record.items {
            let entry = stats.entry(item.product_id.clone()).or_insert_with(|| {
                order.push(item.product_id.clone());
                (0.0, 0.0, 0)
            });
            entry.0 += item.revenue();
            entry.1 += item.quantity;
            if seen.insert(item.product_id.as_str()) {
                entry.2 += 1;
            }
        }
    }

    let mut ranked: Vec<ProductPerformance> = order
        .into_iter()
        .map(|product_id| {
            let (revenue, quantity, transaction_count) = stats[&product_id];
            let share = transaction_count as f64 / total_transactions as f64;
            ProductPerformance {
                product_id,
                revenue,
                quantity,
                transaction_count,
                performance_score: revenue * share,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.performance_score.total_cmp(&a.performance_score));
    ranked.truncate(TOP_PRODUCT_LIMIT);
    ranked
}
