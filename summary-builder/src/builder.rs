// Copyright (c) James Kassemi, SC, US. All rights reserved.

use core_types::{
    Anchor, BuildWarning, ExpiryWindow, GoldRow, PartitionKey, SummaryRow, SummaryState, Table,
};
use expiry_service::ExpiryService;
use log::{info, warn};
use partition_store::{PartitionInfo, PartitionStore};
use serde::{Deserialize, Serialize};

use crate::{
    error::SummaryError,
    metrics::{compute_summary, SummaryInput},
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Recompute summaries already closed at their expiry.
    pub rebuild_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryDisposition {
    Written(PartitionInfo),
    /// A closed summary was left as stored.
    UnchangedClosed,
}

#[derive(Debug, Clone)]
pub struct SummaryBuild {
    pub row: SummaryRow,
    pub warnings: Vec<BuildWarning>,
    pub disposition: SummaryDisposition,
}

pub struct SummaryBuilder<'a> {
    store: &'a PartitionStore,
    options: SummaryOptions,
}

impl<'a> SummaryBuilder<'a> {
    pub fn new(store: &'a PartitionStore, options: SummaryOptions) -> Self {
        Self { store, options }
    }

    /// Rebuilds the summary for one anchor of `window` from the symbol's gold
    /// rows, replacing any stored summary for that expiry.
    pub fn build_summary(
        &self,
        expiries: &ExpiryService,
        window: &ExpiryWindow,
        anchor: Anchor,
    ) -> Result<SummaryBuild, SummaryError> {
        let symbol = window.symbol.as_str();
        let expiry = window.date(anchor);
        let key = PartitionKey::symbol(symbol, expiry);

        if !self.options.rebuild_closed {
            if let Some(existing) = self.closed_summary(&key)? {
                info!(
                    "summary {} {} {} closed as of {}, leaving as stored",
                    symbol, anchor, expiry, existing.as_of_date
                );
                return Ok(SummaryBuild {
                    row: existing,
                    warnings: Vec::new(),
                    disposition: SummaryDisposition::UnchangedClosed,
                });
            }
        }

        let (cycle_start, cycle_warning) = expiries.cycle_start(symbol, expiry);
        let gold_keys = self.store.list_keys(Table::FuturesDay, Some(symbol))?;
        let latest = gold_keys.last().map(|key| key.date);
        let missing = || SummaryError::MissingGold {
            symbol: symbol.to_string(),
            expiry,
            from: cycle_start,
            through: expiry,
        };
        let as_of_date = latest.map(|latest| latest.min(expiry)).ok_or_else(missing)?;

        let mut days: Vec<GoldRow> = Vec::new();
        for key in gold_keys
            .iter()
            .filter(|key| key.date >= cycle_start && key.date <= as_of_date)
        {
            if let Some(rows) = self.store.read::<GoldRow>(Table::FuturesDay, key)? {
                days.extend(rows);
            }
        }
        let (row, mut warnings) = compute_summary(SummaryInput {
            window,
            anchor,
            cycle_start,
            as_of_date,
            days: &days,
        })
        .ok_or_else(missing)?;
        if let Some(warning) = cycle_warning {
            warnings.insert(0, warning);
        }

        let partition = self
            .store
            .write(Table::FuturesSummary, &key, std::slice::from_ref(&row))?;
        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(
            "summary {} {} {}: {} as of {} over {} days (crc32 {:08x})",
            symbol,
            anchor,
            expiry,
            row.state,
            row.as_of_date,
            row.trading_days,
            partition.checksum
        );
        Ok(SummaryBuild {
            row,
            warnings,
            disposition: SummaryDisposition::Written(partition),
        })
    }

    /// Builds both anchors of `window`, each independently.
    pub fn build_window(
        &self,
        expiries: &ExpiryService,
        window: &ExpiryWindow,
    ) -> Vec<(Anchor, Result<SummaryBuild, SummaryError>)> {
        Anchor::BOTH
            .into_iter()
            .map(|anchor| (anchor, self.build_summary(expiries, window, anchor)))
            .collect()
    }

    fn closed_summary(&self, key: &PartitionKey) -> Result<Option<SummaryRow>, SummaryError> {
        let rows = self
            .store
            .read::<SummaryRow>(Table::FuturesSummary, key)?
            .unwrap_or_default();
        Ok(rows
            .into_iter()
            .find(|row| row.state == SummaryState::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{ExpirySource, ObservedExpiry, YearMonth};
    use expiry_service::{ExpiryRule, ObservedExpiryLog};
    use tempfile::tempdir;

    fn june(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn gold(d: u32, oi: i64, mwpl: Option<i64>) -> GoldRow {
        GoldRow {
            symbol: "NIFTY".to_string(),
            trade_date: june(d),
            contract_count: 3,
            near_expiry: june(19),
            near_close: 23_000.0,
            near_settle_price: 23_001.0,
            total_contracts_traded: 100,
            total_value_lakhs: 40.0,
            total_oi_contracts: oi,
            total_change_in_oi_contracts: Some(1),
            lot_size_shares: 25,
            lot_size_mismatch: false,
            total_oi_shares: oi * 25,
            mwpl_shares: mwpl,
            combined_oi_shares: mwpl.map(|m| m / 2),
            mwpl_utilisation_pct: mwpl.map(|_| 50.0),
            mwpl_missing: mwpl.is_none(),
        }
    }

    fn write_gold(store: &PartitionStore, row: GoldRow) {
        store
            .write(
                Table::FuturesDay,
                &PartitionKey::symbol(row.symbol.clone(), row.trade_date),
                &[row],
            )
            .unwrap();
    }

    fn service() -> ExpiryService {
        let mut log = ObservedExpiryLog::new();
        for expiry in [june(5), june(12), june(19), june(26)] {
            log.record(&ObservedExpiry {
                symbol: "NIFTY".to_string(),
                expiry_date: expiry,
                first_seen_date: june(3),
            })
            .unwrap();
        }
        ExpiryService::new(ExpiryRule::default(), log)
    }

    fn window() -> ExpiryWindow {
        ExpiryWindow {
            symbol: "NIFTY".to_string(),
            month: YearMonth::new(2024, 6).unwrap(),
            w1_date: june(5),
            w3_date: june(19),
            w1_source: ExpirySource::Observed,
            w3_source: ExpirySource::Observed,
        }
    }

    #[test]
    fn partial_window_extends_and_overwrites() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let expiries = service();
        let builder = SummaryBuilder::new(&store, SummaryOptions::default());
        let key = PartitionKey::symbol("NIFTY", june(19));
        write_gold(&store, gold(12, 300, Some(100_000)));
        write_gold(&store, gold(13, 310, None));
        write_gold(&store, gold(14, 320, None));

        let open = builder.build_summary(&expiries, &window(), Anchor::W3).unwrap();
        assert_eq!(open.row.cycle_start, june(13));
        assert_eq!(open.row.as_of_date, june(14));
        assert_eq!(open.row.state, SummaryState::Open);
        assert_eq!(open.row.trading_days, 2);
        // The 12th sits in the previous cycle, so no MWPL is visible here.
        assert_eq!(open.row.mwpl_asof_date, None);
        assert_eq!(open.warnings.len(), 1);

        for d in [17, 18, 19, 20] {
            write_gold(&store, gold(d, 300 + d as i64, Some(120_000)));
        }
        let closed = builder.build_summary(&expiries, &window(), Anchor::W3).unwrap();
        assert_eq!(closed.row.as_of_date, june(19));
        assert_eq!(closed.row.state, SummaryState::Closed);
        assert_eq!(closed.row.trading_days, 5);
        assert_eq!(closed.row.mwpl_asof_date, Some(june(19)));
        assert_eq!(closed.row.max_permitted_contracts, Some(4_800));
        assert_eq!(closed.row.threshold_90pct, Some(4_320));

        let stored: Vec<SummaryRow> = store
            .read(Table::FuturesSummary, &key)
            .unwrap()
            .unwrap();
        assert_eq!(stored, vec![closed.row.clone()]);
        assert_eq!(
            store.list_keys(Table::FuturesSummary, Some("NIFTY")).unwrap(),
            vec![key]
        );
    }

    #[test]
    fn closed_summary_is_kept_unless_rebuild_requested() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let expiries = service();
        for d in [3, 4, 5] {
            write_gold(&store, gold(d, 100, Some(50_000)));
        }
        let builder = SummaryBuilder::new(&store, SummaryOptions::default());
        let first = builder.build_summary(&expiries, &window(), Anchor::W1).unwrap();
        assert_eq!(first.row.state, SummaryState::Closed);
        assert!(matches!(first.disposition, SummaryDisposition::Written(_)));

        write_gold(&store, gold(4, 900, Some(50_000)));
        let again = builder.build_summary(&expiries, &window(), Anchor::W1).unwrap();
        assert_eq!(again.disposition, SummaryDisposition::UnchangedClosed);
        assert_eq!(again.row.max_oi_contracts, 100);

        let forced = SummaryBuilder::new(
            &store,
            SummaryOptions {
                rebuild_closed: true,
            },
        )
        .build_summary(&expiries, &window(), Anchor::W1)
        .unwrap();
        assert!(matches!(forced.disposition, SummaryDisposition::Written(_)));
        assert_eq!(forced.row.max_oi_contracts, 900);
    }

    #[test]
    fn first_cycle_uses_calendar_start_and_missing_gold_fails() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let expiries = service();
        let builder = SummaryBuilder::new(&store, SummaryOptions::default());

        let err = builder
            .build_summary(&expiries, &window(), Anchor::W1)
            .unwrap_err();
        assert_eq!(err.kind(), core_types::FailureKind::MissingInput);

        write_gold(&store, gold(3, 100, Some(50_000)));
        let build = builder.build_summary(&expiries, &window(), Anchor::W1).unwrap();
        assert_eq!(build.row.cycle_start, NaiveDate::from_ymd_opt(2024, 5, 30).unwrap());
        assert!(matches!(
            build.warnings.first(),
            Some(BuildWarning::HeuristicFallback { .. })
        ));

        let results = builder.build_window(&expiries, &window());
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(SummaryError::MissingGold { .. })));
    }
}
