// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Keyed parquet partitions with atomic overwrite.
//!
//! Callers address data by `(Table, PartitionKey)` only; the directory layout
//! lives in [`layout`] and nowhere else.

mod codec;
mod error;
mod layout;
mod store;

pub use codec::PartitionRecord;
pub use error::StoreError;
pub use store::{PartitionInfo, PartitionStore};
