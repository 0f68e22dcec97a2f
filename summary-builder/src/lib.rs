// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Per-expiry summaries (`gold.futures_summary`) reduced from daily gold rows.

mod builder;
mod error;
mod locf;
mod metrics;

pub use builder::{SummaryBuild, SummaryBuilder, SummaryDisposition, SummaryOptions};
pub use error::SummaryError;
pub use locf::{MwplIndex, MwplObservation};
pub use metrics::{compute_summary, SummaryInput};
