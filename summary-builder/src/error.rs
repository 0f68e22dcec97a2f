// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use core_types::FailureKind;
use partition_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("missing input: no gold rows for {symbol} between {from} and {through} (expiry {expiry})")]
    MissingGold {
        symbol: String,
        expiry: NaiveDate,
        from: NaiveDate,
        through: NaiveDate,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SummaryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SummaryError::MissingGold { .. } => FailureKind::MissingInput,
            SummaryError::Store(_) => FailureKind::Storage,
        }
    }
}
