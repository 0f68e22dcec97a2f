// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::io;

use arrow::error::ArrowError;
use core_types::Table;
use parquet::errors::ParquetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Arrow(#[from] ArrowError),
    #[error("parquet error: {0}")]
    Parquet(#[from] ParquetError),
    #[error("schema mismatch for {table}: {message}")]
    Schema { table: Table, message: String },
}

impl StoreError {
    pub(crate) fn schema(table: Table, message: impl Into<String>) -> Self {
        StoreError::Schema {
            table,
            message: message.into(),
        }
    }
}
