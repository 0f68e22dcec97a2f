// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A calendar month, the unit expiry windows are resolved for.
///
/// Holds the month's first day, so every value names a month chrono can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    first: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid month '{0}' (expected YYYY-MM)")]
pub struct ParseMonthError(pub String);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date - Days::new(u64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        (28..=31)
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(self.year(), self.month(), day))
            .unwrap_or(self.first)
    }

    /// The following month, or `None` past the last representable date.
    pub fn succ(&self) -> Option<Self> {
        self.last_day().succ_opt().map(Self::of)
    }

    /// The preceding month, or `None` before the first representable date.
    pub fn pred(&self) -> Option<Self> {
        self.first.pred_opt().map(Self::of)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }

    /// The `n`th (1-based) occurrence of `weekday` in this month, if the month has one.
    pub fn nth_weekday(&self, weekday: Weekday, n: u32) -> Option<NaiveDate> {
        if n == 0 {
            return None;
        }
        let offset =
            (7 + weekday.num_days_from_monday() - self.first.weekday().num_days_from_monday()) % 7;
        let day = 1 + offset + 7 * (n - 1);
        NaiveDate::from_ymd_opt(self.year(), self.month(), day)
    }

    /// Months touched by the inclusive date range, ascending.
    pub fn span(start: NaiveDate, end: NaiveDate) -> Vec<Self> {
        let mut out = Vec::new();
        if end < start {
            return out;
        }
        let last = Self::of(end);
        let mut current = Some(Self::of(start));
        while let Some(month) = current.filter(|month| *month <= last) {
            out.push(month);
            current = month.succ();
        }
        out
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthError(value.to_string());
        let (year, month) = value.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ParseMonthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn nth_weekday_walks_the_month() {
        let june = YearMonth::new(2024, 6).unwrap();
        assert_eq!(june.nth_weekday(Weekday::Wed, 1), Some(d(2024, 6, 5)));
        assert_eq!(june.nth_weekday(Weekday::Wed, 3), Some(d(2024, 6, 19)));
        assert_eq!(june.nth_weekday(Weekday::Sat, 1), Some(d(2024, 6, 1)));
        assert_eq!(june.nth_weekday(Weekday::Wed, 5), None);
        assert_eq!(june.nth_weekday(Weekday::Wed, 0), None);
    }

    #[test]
    fn boundaries_and_navigation() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), d(2024, 2, 29));
        assert_eq!(YearMonth::new(2024, 12).unwrap().succ(), YearMonth::new(2025, 1));
        assert_eq!(YearMonth::new(2024, 1).unwrap().pred(), YearMonth::new(2023, 12));
        assert_eq!(YearMonth::of(d(2024, 2, 29)), feb);
        assert!(feb.contains(d(2024, 2, 10)));
        assert!(!feb.contains(d(2024, 3, 1)));
        assert!(YearMonth::new(2024, 13).is_none());
    }

    #[test]
    fn parses_and_spans() {
        let month: YearMonth = "2024-04".parse().unwrap();
        assert_eq!(month.to_string(), "2024-04");
        assert!("2024/04".parse::<YearMonth>().is_err());
        let span = YearMonth::span(d(2024, 11, 20), d(2025, 1, 3));
        let labels: Vec<String> = span.iter().map(|m| m.to_string()).collect();
        assert_eq!(labels, vec!["2024-11", "2024-12", "2025-01"]);
    }

    #[test]
    fn navigation_stops_at_representable_range() {
        let last = YearMonth::of(NaiveDate::MAX);
        assert_eq!(last.succ(), None);
        assert_eq!(last.last_day(), NaiveDate::MAX);
        let first = YearMonth::of(NaiveDate::MIN);
        assert_eq!(first.pred(), None);
        assert_eq!(first.first_day(), NaiveDate::MIN);
        assert_eq!(YearMonth::span(NaiveDate::MAX, NaiveDate::MAX), vec![last]);
    }
}
