// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Refinement stage a table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Silver,
    Gold,
}

impl Layer {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Layer::Silver => "silver",
            Layer::Gold => "gold",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Normalized futures bhavcopy, one partition per trade date.
    FoBhavcopyDay,
    /// Normalized market-wide position limits, one partition per trade date.
    MwplCombinedDay,
    /// Per-symbol daily features.
    FuturesDay,
    /// Per-symbol summaries keyed by expiry date.
    FuturesSummary,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::FoBhavcopyDay,
        Table::MwplCombinedDay,
        Table::FuturesDay,
        Table::FuturesSummary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::FoBhavcopyDay => "fo_bhavcopy_day",
            Table::MwplCombinedDay => "mwpl_combined_day",
            Table::FuturesDay => "futures_day",
            Table::FuturesSummary => "futures_summary",
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Table::FoBhavcopyDay | Table::MwplCombinedDay => Layer::Silver,
            Table::FuturesDay | Table::FuturesSummary => Layer::Gold,
        }
    }

    /// Whether partitions of this table are addressed per symbol.
    pub fn is_symbolled(&self) -> bool {
        matches!(self, Table::FuturesDay | Table::FuturesSummary)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer().dir_name(), self.name())
    }
}

/// Logical partition address. Ordered by date, then symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionKey {
    pub date: NaiveDate,
    pub symbol: Option<String>,
}

impl PartitionKey {
    pub fn day(date: NaiveDate) -> Self {
        Self { date, symbol: None }
    }

    pub fn symbol(symbol: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            date,
            symbol: Some(symbol.into()),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{}@{}", symbol, self.date),
            None => write!(f, "{}", self.date),
        }
    }
}
