// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use core_types::{FoBhavcopyRow, MwplRow, PartitionKey, Table};
use partition_store::PartitionStore;

use crate::error::GoldError;

/// Silver inputs for one trade date, read once and shared across symbols.
#[derive(Debug, Clone)]
pub struct SilverDay {
    pub date: NaiveDate,
    pub futures: Vec<FoBhavcopyRow>,
    /// `None` when the MWPL partition for the date has not been ingested.
    pub mwpl: Option<Vec<MwplRow>>,
}

/// MWPL availability for one symbol on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MwplLookup<'a> {
    Found(&'a MwplRow),
    PartitionMissing,
    SymbolMissing,
}

impl SilverDay {
    /// Fails with a missing-input error when the futures partition is absent;
    /// a missing MWPL partition is tolerated.
    pub fn load(store: &PartitionStore, date: NaiveDate) -> Result<Self, GoldError> {
        let key = PartitionKey::day(date);
        let futures = store
            .read::<FoBhavcopyRow>(Table::FoBhavcopyDay, &key)?
            .ok_or(GoldError::MissingPartition {
                table: Table::FoBhavcopyDay,
                date,
            })?;
        let mwpl = store.read::<MwplRow>(Table::MwplCombinedDay, &key)?;
        Ok(Self {
            date,
            futures,
            mwpl,
        })
    }

    pub fn symbols(&self) -> BTreeSet<String> {
        self.futures.iter().map(|row| row.symbol.clone()).collect()
    }

    pub fn futures_for(&self, symbol: &str) -> Vec<&FoBhavcopyRow> {
        self.futures
            .iter()
            .filter(|row| row.symbol == symbol)
            .collect()
    }

    /// The symbol's MWPL row. Exact duplicates collapse; conflicting ones are an error.
    pub fn mwpl_for(&self, symbol: &str) -> Result<MwplLookup<'_>, GoldError> {
        let Some(rows) = &self.mwpl else {
            return Ok(MwplLookup::PartitionMissing);
        };
        let mut found: Option<&MwplRow> = None;
        for row in rows.iter().filter(|row| row.symbol == symbol) {
            match found {
                Some(existing) if existing != row => {
                    return Err(GoldError::DataConsistency {
                        symbol: symbol.to_string(),
                        date: self.date,
                        message: format!(
                            "conflicting MWPL rows ({} / {} vs {} / {})",
                            existing.mwpl_shares,
                            existing.combined_oi_shares,
                            row.mwpl_shares,
                            row.combined_oi_shares
                        ),
                    });
                }
                Some(_) => {}
                None => found = Some(row),
            }
        }
        Ok(found.map_or(MwplLookup::SymbolMissing, MwplLookup::Found))
    }
}
