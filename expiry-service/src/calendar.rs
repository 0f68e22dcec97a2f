// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use core_types::YearMonth;

/// Calendar rule used when observed expiries are not available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryRule {
    weekday: Weekday,
    holidays: BTreeSet<NaiveDate>,
    cycle_days: u32,
}

impl Default for ExpiryRule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Wed,
            holidays: BTreeSet::new(),
            cycle_days: 7,
        }
    }
}

impl ExpiryRule {
    pub fn new(
        weekday: Weekday,
        holidays: impl IntoIterator<Item = NaiveDate>,
        cycle_days: u32,
    ) -> Self {
        Self {
            weekday,
            holidays: holidays.into_iter().collect(),
            cycle_days: cycle_days.max(1),
        }
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn cycle_days(&self) -> u32 {
        self.cycle_days
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Monday to Friday and not a configured holiday.
    pub fn is_trading_weekday(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// The `ordinal`-th expiry weekday of `month`, moved back to the previous
    /// trading weekday when it lands on a holiday. `None` if that leaves the month.
    pub fn expected_expiry(&self, month: YearMonth, ordinal: usize) -> Option<NaiveDate> {
        let n = u32::try_from(ordinal).ok()?;
        let mut date = month.nth_weekday(self.weekday, n)?;
        while !self.is_trading_weekday(date) {
            date = date.pred_opt()?;
            if !month.contains(date) {
                return None;
            }
        }
        Some(date)
    }

    /// Cycle start assumed when no earlier expiry has been observed.
    pub fn default_cycle_start(&self, expiry: NaiveDate) -> NaiveDate {
        expiry - Duration::days(i64::from(self.cycle_days) - 1)
    }
}
