// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use core_types::{FailureKind, Table};
use partition_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoldError {
    #[error("missing input: no {table} partition for {date}")]
    MissingPartition { table: Table, date: NaiveDate },
    #[error("missing input: no {table} rows for {symbol} on {date}")]
    MissingSymbol {
        table: Table,
        symbol: String,
        date: NaiveDate,
    },
    #[error("data consistency error for {symbol} on {date}: {message}")]
    DataConsistency {
        symbol: String,
        date: NaiveDate,
        message: String,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl GoldError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GoldError::MissingPartition { .. } | GoldError::MissingSymbol { .. } => {
                FailureKind::MissingInput
            }
            GoldError::DataConsistency { .. } => FailureKind::DataConsistency,
            GoldError::Store(_) => FailureKind::Storage,
        }
    }
}
