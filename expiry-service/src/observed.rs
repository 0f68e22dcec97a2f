// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use core_types::{FoBhavcopyRow, ObservedExpiry, PartitionKey, Table, YearMonth};
use log::{debug, warn};
use partition_store::PartitionStore;

use crate::error::ExpiryError;

/// Append-only set of observed expiries per symbol, keyed by expiry date.
///
/// Records are immutable once stored: re-observing an expiry leaves the
/// stored first-seen date as is. Scans read silver in date order, so the
/// stored date is the earliest one scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedExpiryLog {
    entries: BTreeMap<String, BTreeMap<NaiveDate, NaiveDate>>,
}

/// Observation refused by the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedObservation {
    pub observation: ObservedExpiry,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub log: ObservedExpiryLog,
    pub rejected: Vec<RejectedObservation>,
    /// Silver partitions read.
    pub partitions: usize,
}

impl ObservedExpiryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `observation`. Returns `true` when the expiry date is new for
    /// the symbol; a known expiry is left untouched.
    pub fn record(&mut self, observation: &ObservedExpiry) -> Result<bool, ExpiryError> {
        if observation.first_seen_date > observation.expiry_date {
            return Err(ExpiryError::consistency(
                &observation.symbol,
                observation.expiry_date,
                format!(
                    "expiry {} first seen on {}, after it expired",
                    observation.expiry_date, observation.first_seen_date
                ),
            ));
        }
        let expiries = self.entries.entry(observation.symbol.clone()).or_default();
        if expiries.contains_key(&observation.expiry_date) {
            return Ok(false);
        }
        expiries.insert(observation.expiry_date, observation.first_seen_date);
        Ok(true)
    }

    /// Distinct observed expiries of `symbol` inside `month`, ascending.
    pub fn expiries_in(&self, symbol: &str, month: YearMonth) -> Vec<NaiveDate> {
        self.entries
            .get(symbol)
            .map(|expiries| {
                expiries
                    .range(month.first_day()..=month.last_day())
                    .map(|(expiry, _)| *expiry)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, symbol: &str, expiry: NaiveDate) -> bool {
        self.first_seen(symbol, expiry).is_some()
    }

    pub fn first_seen(&self, symbol: &str, expiry: NaiveDate) -> Option<NaiveDate> {
        self.entries.get(symbol)?.get(&expiry).copied()
    }

    /// Latest observed expiry strictly before `before`.
    pub fn previous_expiry(&self, symbol: &str, before: NaiveDate) -> Option<NaiveDate> {
        self.entries
            .get(symbol)?
            .range(..before)
            .next_back()
            .map(|(expiry, _)| *expiry)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = ObservedExpiry> + '_ {
        self.entries.iter().flat_map(|(symbol, expiries)| {
            expiries
                .iter()
                .map(move |(expiry, first_seen)| ObservedExpiry {
                    symbol: symbol.clone(),
                    expiry_date: *expiry,
                    first_seen_date: *first_seen,
                })
        })
    }

    /// Builds a log from the silver futures partitions dated `from..=through`.
    /// An empty `symbols` set keeps every symbol. Store failures abort the scan;
    /// inconsistent observations are collected and skipped.
    pub fn scan_silver(
        store: &PartitionStore,
        symbols: &BTreeSet<String>,
        from: NaiveDate,
        through: NaiveDate,
    ) -> Result<ScanOutcome, ExpiryError> {
        let mut outcome = ScanOutcome::default();
        let mut seen_rejections = BTreeSet::new();
        let keys: Vec<PartitionKey> = store
            .list_keys(Table::FoBhavcopyDay, None)?
            .into_iter()
            .filter(|key| key.date >= from && key.date <= through)
            .collect();
        for key in keys {
            let Some(rows) = store.read::<FoBhavcopyRow>(Table::FoBhavcopyDay, &key)? else {
                continue;
            };
            outcome.partitions += 1;
            for row in rows {
                if !symbols.is_empty() && !symbols.contains(&row.symbol) {
                    continue;
                }
                let observation = ObservedExpiry {
                    symbol: row.symbol,
                    expiry_date: row.expiry_date,
                    first_seen_date: key.date,
                };
                if let Err(err) = outcome.log.record(&observation) {
                    if seen_rejections.insert(observation.clone()) {
                        warn!("rejected observed expiry: {}", err);
                        outcome.rejected.push(RejectedObservation {
                            observation,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
        debug!(
            "scanned {} silver partitions between {} and {}: {} observed expiries",
            outcome.partitions,
            from,
            through,
            outcome.log.len()
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn obs(symbol: &str, expiry: NaiveDate, first_seen: NaiveDate) -> ObservedExpiry {
        ObservedExpiry {
            symbol: symbol.to_string(),
            expiry_date: expiry,
            first_seen_date: first_seen,
        }
    }

    fn fut(trade: NaiveDate, symbol: &str, expiry: NaiveDate) -> FoBhavcopyRow {
        FoBhavcopyRow {
            trade_date: trade,
            instrument: "FUTIDX".to_string(),
            symbol: symbol.to_string(),
            expiry_date: expiry,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            settle_price: 1.0,
            contracts: 1,
            value_lakhs: 1.0,
            open_interest_contracts: 1,
            lot_size_shares: 25,
            change_in_oi_contracts: None,
        }
    }

    #[test]
    fn duplicates_collapse_and_stored_records_never_change() {
        let mut log = ObservedExpiryLog::new();
        assert!(log.record(&obs("NIFTY", date(6, 12), date(6, 4))).unwrap());
        assert!(!log.record(&obs("NIFTY", date(6, 12), date(6, 6))).unwrap());
        assert!(!log.record(&obs("NIFTY", date(6, 12), date(6, 3))).unwrap());
        assert_eq!(log.len(), 1);
        assert_eq!(log.first_seen("NIFTY", date(6, 12)), Some(date(6, 4)));
        assert_eq!(
            log.iter().collect::<Vec<_>>(),
            vec![obs("NIFTY", date(6, 12), date(6, 4))]
        );
    }

    #[test]
    fn expiry_seen_after_it_expired_is_inconsistent() {
        let mut log = ObservedExpiryLog::new();
        let err = log.record(&obs("NIFTY", date(6, 12), date(6, 13))).unwrap_err();
        assert!(matches!(err, ExpiryError::DataConsistency { .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn month_and_previous_lookups() {
        let mut log = ObservedExpiryLog::new();
        for expiry in [date(5, 29), date(6, 26), date(6, 5), date(6, 12), date(7, 3)] {
            log.record(&obs("NIFTY", expiry, date(5, 2))).unwrap();
        }
        let june = YearMonth::new(2024, 6).unwrap();
        assert_eq!(
            log.expiries_in("NIFTY", june),
            vec![date(6, 5), date(6, 12), date(6, 26)]
        );
        assert!(log.expiries_in("BANKNIFTY", june).is_empty());
        assert_eq!(log.previous_expiry("NIFTY", date(6, 5)), Some(date(5, 29)));
        assert_eq!(log.previous_expiry("NIFTY", date(5, 29)), None);
    }

    #[test]
    fn scan_reads_silver_within_range() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let write = |trade: NaiveDate, rows: Vec<FoBhavcopyRow>| {
            store
                .write(Table::FoBhavcopyDay, &PartitionKey::day(trade), &rows)
                .unwrap();
        };
        write(
            date(6, 3),
            vec![
                fut(date(6, 3), "NIFTY", date(6, 5)),
                fut(date(6, 3), "ACC", date(6, 27)),
            ],
        );
        write(
            date(6, 4),
            vec![
                fut(date(6, 4), "NIFTY", date(6, 5)),
                fut(date(6, 4), "NIFTY", date(6, 12)),
            ],
        );
        write(date(6, 6), vec![fut(date(6, 6), "NIFTY", date(6, 5))]);
        write(date(7, 1), vec![fut(date(7, 1), "NIFTY", date(7, 3))]);

        let symbols: BTreeSet<String> = ["NIFTY".to_string()].into_iter().collect();
        let outcome =
            ObservedExpiryLog::scan_silver(&store, &symbols, date(6, 1), date(6, 30)).unwrap();

        assert_eq!(outcome.partitions, 3);
        assert_eq!(outcome.log.len(), 2);
        assert_eq!(outcome.log.first_seen("NIFTY", date(6, 5)), Some(date(6, 3)));
        assert_eq!(outcome.log.first_seen("NIFTY", date(6, 12)), Some(date(6, 4)));
        assert!(!outcome.log.contains("ACC", date(6, 27)));
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].observation.first_seen_date, date(6, 6));
    }
}
