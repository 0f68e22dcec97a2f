// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared row types, table catalogue, schemas and configuration for the futures data pipeline.

pub mod config;
pub mod month;
pub mod schema;
pub mod tables;
pub mod types;
pub mod warning;

pub use month::{ParseMonthError, YearMonth};
pub use tables::{Layer, PartitionKey, Table};
pub use types::{
    Anchor, ExpirySource, ExpiryWindow, FoBhavcopyRow, GoldRow, MwplRow, ObservedExpiry,
    ParseEnumError, SummaryRow, SummaryState,
};
pub use warning::{BuildWarning, FailureKind, FallbackField};
