// 📅 Month keys and calendar month enumeration
//
// Months are handled as a single index (`year * 12 + month0`) so ranges are
// plain integer ranges: strictly increasing, no gaps, and no end-of-month
// rollover surprises from calendar arithmetic.

use crate::error::{LedgerError, Result};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ============================================================================
// MONTH KEY
// ============================================================================

/// A calendar month, rendered `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    /// 1..=12
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(LedgerError::Validation(format!(
                "invalid month {:04}-{:02}",
                year, month
            )));
        }
        Ok(MonthKey { year, month })
    }

    /// Month containing `date`
    pub fn of(date: NaiveDate) -> Self {
        MonthKey {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month containing today's local date
    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn from_index(index: i64) -> Self {
        MonthKey {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// Month `n` months later (negative goes back)
    pub fn offset(&self, n: i64) -> Self {
        Self::from_index(self.index() + n)
    }

    /// Human label, e.g. "October 2023"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// `LIKE` pattern matching stored `YYYY-MM-DD` dates in this month
    pub fn like_pattern(&self) -> String {
        format!("{}%", self)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LedgerError::Validation(format!("invalid month '{}' (expected YYYY-MM)", s));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthKey::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// MONTH RANGE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthEntry {
    pub key: MonthKey,
    pub label: String,
}

impl From<MonthKey> for MonthEntry {
    fn from(key: MonthKey) -> Self {
        MonthEntry {
            label: key.label(),
            key,
        }
    }
}

/// Every month from `earliest`'s month through `months_ahead` months past
/// `today`'s month, inclusive.
///
/// The start never goes past today's month, so the current month is always
/// part of the range even when the earliest date lies in the future.
pub fn month_range(earliest: NaiveDate, today: NaiveDate, months_ahead: u32) -> Vec<MonthEntry> {
    let current = MonthKey::of(today).index();
    let start = MonthKey::of(earliest).index().min(current);
    let end = current + months_ahead as i64;

    (start..=end)
        .map(|index| MonthEntry::from(MonthKey::from_index(index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_display_and_parse() {
        let key: MonthKey = "2023-10".parse().unwrap();
        assert_eq!(key.year(), 2023);
        assert_eq!(key.month(), 10);
        assert_eq!(key.to_string(), "2023-10");
        assert_eq!(key.label(), "October 2023");
        assert_eq!(key.like_pattern(), "2023-10%");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["2023-13", "2023-00", "2023-1", "23-10", "2023/10", "abcd-ef", ""] {
            assert!(bad.parse::<MonthKey>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_index_round_trip_across_year_boundary() {
        let december = MonthKey::new(2023, 12).unwrap();
        assert_eq!(december.offset(1), MonthKey::new(2024, 1).unwrap());
        assert_eq!(MonthKey::new(2024, 1).unwrap().offset(-1), december);
        assert_eq!(december.offset(14), MonthKey::new(2025, 2).unwrap());
    }

    #[test]
    fn test_contains() {
        let key = MonthKey::new(2024, 2).unwrap();
        assert!(key.contains(date(2024, 2, 29)));
        assert!(!key.contains(date(2024, 3, 1)));
    }

    #[test]
    fn test_range_spans_earliest_to_ten_ahead() {
        let range = month_range(date(2023, 10, 27), date(2024, 1, 31), 10);

        assert_eq!(range.first().unwrap().key.to_string(), "2023-10");
        assert_eq!(range.last().unwrap().key.to_string(), "2024-11");
        // Oct..Dec 2023 (3) + Jan..Nov 2024 (11)
        assert_eq!(range.len(), 14);
    }

    #[test]
    fn test_range_is_strictly_increasing_without_gaps() {
        let range = month_range(date(2019, 11, 30), date(2024, 3, 31), 10);

        for pair in range.windows(2) {
            assert_eq!(pair[1].key.index(), pair[0].key.index() + 1);
            assert!(pair[1].key.to_string() > pair[0].key.to_string());
        }
    }

    #[test]
    fn test_range_with_no_history_starts_at_today() {
        let today = date(2024, 5, 15);
        let range = month_range(today, today, 10);

        assert_eq!(range.len(), 11);
        assert_eq!(range[0].key, MonthKey::of(today));
        assert_eq!(range[0].label, "May 2024");
    }

    #[test]
    fn test_range_with_future_earliest_still_includes_today() {
        let range = month_range(date(2025, 1, 1), date(2024, 5, 15), 2);
        let keys: Vec<String> = range.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(keys, vec!["2024-05", "2024-06", "2024-07"]);
    }

    #[test]
    fn test_serde_as_string() {
        let key = MonthKey::new(2026, 2).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2026-02\"");
        let back: MonthKey = serde_json::from_str("\"2026-02\"").unwrap();
        assert_eq!(back, key);
        assert!(serde_json::from_str::<MonthKey>("\"2026-2\"").is_err());
    }
}
