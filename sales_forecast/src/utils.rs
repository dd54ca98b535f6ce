//! Utility functions for the sales_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};

/// Split a series into a training prefix and a held-out suffix of `holdout` values
pub fn holdout_split(data: &[f64], holdout: usize) -> (&[f64], &[f64]) {
    let split = data.len().saturating_sub(holdout);
    data.split_at(split)
}

/// The `horizon` calendar days following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    (1..=horizon)
        .map(|offset| {
            last_date
                .checked_add_signed(Duration::days(offset as i64))
                .ok_or_else(|| {
                    ForecastError::InvalidParameter(format!(
                        "Forecast horizon {} overflows the calendar after {}",
                        horizon, last_date
                    ))
                })
        })
        .collect()
}

/// Date and timestamp parsing for loaders and the CLI
pub mod date_parser {
    use crate::error::{ForecastError, Result};
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    /// Parse a `YYYY-MM-DD` calendar date
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| ForecastError::Parse(format!("invalid date '{}': {}", s, e)))
    }

    /// Parse an ISO-8601 timestamp into UTC
    ///
    /// Accepts RFC 3339 with an offset, a naive `YYYY-MM-DDTHH:MM:SS` or
    /// `YYYY-MM-DD HH:MM:SS` (read as UTC), or a bare date (midnight UTC).
    pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(ts.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(naive.and_utc());
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
        Err(ForecastError::Parse(format!("invalid timestamp '{}'", s)))
    }
}
