// months.rs

use std::fmt;
use std::str::FromStr;

pub const FIRST_YEAR: u16 = 2018;
pub const LAST_YEAR: u16 = 2025;
/// Data for the last year stops at September.
pub const LAST_MONTH_OF_LAST_YEAR: u8 = 9;

/// A calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: u16,
    pub month: u8,
}

impl MonthKey {
    pub fn new(year: u16, month: u8) -> Option<MonthKey> {
        (1..=12).contains(&month).then_some(MonthKey { year, month })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMonthKeyError(String);

impl fmt::Display for ParseMonthKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid month key '{}', expected YYYY-MM", self.0)
    }
}

impl std::error::Error for ParseMonthKeyError {}

impl FromStr for MonthKey {
    type Err = ParseMonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthKeyError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year: u16 = year.parse().map_err(|_| err())?;
        let month: u8 = month.parse().map_err(|_| err())?;
        MonthKey::new(year, month).ok_or_else(err)
    }
}

/// Every month covered by the dataset, oldest first.
pub fn month_index() -> Vec<MonthKey> {
    let mut months = Vec::new();
    for year in FIRST_YEAR..=LAST_YEAR {
        let max_month = if year == LAST_YEAR {
            LAST_MONTH_OF_LAST_YEAR
        } else {
            12
        };
        for month in 1..=max_month {
            months.push(MonthKey { year, month });
        }
    }
    months
}
