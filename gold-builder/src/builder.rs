// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use core_types::{BuildWarning, GoldRow, PartitionKey, Table};
use log::{info, warn};
use partition_store::{PartitionInfo, PartitionStore};

use crate::{error::GoldError, features::compute_gold_row, silver::SilverDay};

/// A written gold row and what it took to produce it.
#[derive(Debug, Clone)]
pub struct GoldBuild {
    pub row: GoldRow,
    pub warnings: Vec<BuildWarning>,
    pub partition: PartitionInfo,
}

pub struct GoldBuilder<'a> {
    store: &'a PartitionStore,
}

impl<'a> GoldBuilder<'a> {
    pub fn new(store: &'a PartitionStore) -> Self {
        Self { store }
    }

    /// Rebuilds `gold.futures_day` at (symbol, date), replacing any prior row.
    pub fn build_day(&self, symbol: &str, date: NaiveDate) -> Result<GoldBuild, GoldError> {
        let silver = SilverDay::load(self.store, date)?;
        self.build_from(&silver, symbol)
    }

    /// Builds every symbol in `symbols` (all symbols present in silver when
    /// empty) against one read of the date's silver partitions. Per-symbol
    /// failures are returned alongside successes.
    pub fn build_date(
        &self,
        date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<(String, Result<GoldBuild, GoldError>)>, GoldError> {
        let silver = SilverDay::load(self.store, date)?;
        let symbols: Vec<String> = if symbols.is_empty() {
            silver.symbols().into_iter().collect()
        } else {
            symbols.to_vec()
        };
        Ok(symbols
            .into_iter()
            .map(|symbol| {
                let result = self.build_from(&silver, &symbol);
                (symbol, result)
            })
            .collect())
    }

    pub fn build_from(&self, silver: &SilverDay, symbol: &str) -> Result<GoldBuild, GoldError> {
        let futures = silver.futures_for(symbol);
        let mwpl = silver.mwpl_for(symbol)?;
        let (row, warnings) = compute_gold_row(symbol, silver.date, &futures, mwpl)?;
        let key = PartitionKey::symbol(symbol, silver.date);
        let partition = self
            .store
            .write(Table::FuturesDay, &key, std::slice::from_ref(&row))?;
        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(
            "gold {} {}: {} contracts, oi {} (crc32 {:08x})",
            symbol, silver.date, row.contract_count, row.total_oi_contracts, partition.checksum
        );
        Ok(GoldBuild {
            row,
            warnings,
            partition,
        })
    }
}
