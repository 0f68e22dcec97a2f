// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::io;

use chrono::NaiveDate;
use config::ConfigError;
use expiry_service::ExpiryError;
use partition_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("expiry error: {0}")]
    Expiry(#[from] ExpiryError),
    #[error("manifest io error: {0}")]
    Io(#[from] io::Error),
    #[error("manifest encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
