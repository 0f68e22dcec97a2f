// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use core_types::{FailureKind, YearMonth};
use partition_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpiryError {
    #[error("data consistency error for {symbol} {month}: {message}")]
    DataConsistency {
        symbol: String,
        month: YearMonth,
        message: String,
    },
    #[error("calendar rule has no expiry #{ordinal} in {month}")]
    Calendar { month: YearMonth, ordinal: usize },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ExpiryError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExpiryError::DataConsistency { .. } | ExpiryError::Calendar { .. } => {
                FailureKind::DataConsistency
            }
            ExpiryError::Store(_) => FailureKind::Storage,
        }
    }

    pub(crate) fn consistency(symbol: &str, date: NaiveDate, message: impl Into<String>) -> Self {
        ExpiryError::DataConsistency {
            symbol: symbol.to_string(),
            month: YearMonth::of(date),
            message: message.into(),
        }
    }
}
