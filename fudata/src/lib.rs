// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Sequences gold and summary builds over a date range and records the outcome.

mod error;
pub mod manifest;
mod pipeline;
mod report;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineOptions};
pub use report::{RunReport, SummaryOutcome, UnitFailure};
