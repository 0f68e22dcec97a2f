// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use core_types::GoldRow;

/// MWPL figures as published for one trade date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MwplObservation {
    pub mwpl_shares: i64,
    pub combined_oi_shares: i64,
    /// Near-contract lot size on the observation date.
    pub lot_size_shares: i64,
}

/// Date-sorted MWPL observations answering "latest at or before day".
#[derive(Debug, Clone, Default)]
pub struct MwplIndex {
    entries: Vec<(NaiveDate, MwplObservation)>,
}

impl MwplIndex {
    /// Later entries for a repeated date replace earlier ones.
    pub fn new(mut entries: Vec<(NaiveDate, MwplObservation)>) -> Self {
        entries.sort_by_key(|(date, _)| *date);
        let mut deduped: Vec<(NaiveDate, MwplObservation)> = Vec::with_capacity(entries.len());
        for entry in entries {
            match deduped.last_mut() {
                Some(last) if last.0 == entry.0 => *last = entry,
                _ => deduped.push(entry),
            }
        }
        Self { entries: deduped }
    }

    /// Observations carried by gold rows that were enriched with MWPL.
    pub fn from_gold(rows: &[GoldRow]) -> Self {
        Self::new(
            rows.iter()
                .filter_map(|row| {
                    let (mwpl_shares, combined_oi_shares) =
                        row.mwpl_shares.zip(row.combined_oi_shares)?;
                    Some((
                        row.trade_date,
                        MwplObservation {
                            mwpl_shares,
                            combined_oi_shares,
                            lot_size_shares: row.lot_size_shares,
                        },
                    ))
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|(date, _)| *date)
    }

    /// Latest observation dated on or before `day`.
    pub fn asof(&self, day: NaiveDate) -> Option<(NaiveDate, &MwplObservation)> {
        let idx = self.entries.partition_point(|(date, _)| *date <= day);
        let (date, observation) = self.entries.get(idx.checked_sub(1)?)?;
        Some((*date, observation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn obs(mwpl: i64) -> MwplObservation {
        MwplObservation {
            mwpl_shares: mwpl,
            combined_oi_shares: 0,
            lot_size_shares: 1,
        }
    }

    #[test]
    fn carries_last_observation_forward() {
        let index = MwplIndex::new(vec![(day(3), obs(30)), (day(1), obs(10))]);

        assert_eq!(index.asof(day(1)), Some((day(1), &obs(10))));
        assert_eq!(index.asof(day(2)), Some((day(1), &obs(10))));
        assert_eq!(index.asof(day(3)), Some((day(3), &obs(30))));
        assert_eq!(index.asof(day(4)), Some((day(3), &obs(30))));
        assert_eq!(index.asof(day(5)), Some((day(3), &obs(30))));
    }

    #[test]
    fn nothing_before_first_observation() {
        let index = MwplIndex::new(vec![(day(3), obs(30))]);
        assert_eq!(index.asof(day(2)), None);
        assert!(MwplIndex::default().asof(day(9)).is_none());
    }

    #[test]
    fn repeated_date_keeps_last_entry() {
        let index = MwplIndex::new(vec![(day(2), obs(10)), (day(2), obs(20))]);
        assert_eq!(index.asof(day(2)), Some((day(2), &obs(20))));
    }
}
