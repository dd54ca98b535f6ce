//! Calendar lookup tables
//!
//! Weekday indices follow the Sunday-first convention: 0 = Sunday … 6 = Saturday.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Three-month season of the (northern) calendar year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    /// Position in [`Season::ALL`]
    pub fn index(self) -> usize {
        match self {
            Season::Winter => 0,
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Autumn => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

/// Season of a calendar month (1 = January)
///
/// Months outside 1..=12 wrap around, so the mapping is total.
pub fn season_for_month(month: u32) -> Season {
    match (month + 11) % 12 + 1 {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Autumn,
    }
}

/// English name of a Sunday-first weekday index; indices wrap modulo 7
pub fn weekday_name(index: usize) -> &'static str {
    WEEKDAY_NAMES[index % 7]
}

/// Sunday-first weekday index of a date
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}
