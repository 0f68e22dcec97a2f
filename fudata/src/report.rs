// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Anchor, BuildWarning, FailureKind, SummaryState};
use partition_store::PartitionInfo;
use serde::{Deserialize, Serialize};

/// A unit of work (one gold day or one summary) that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub symbol: String,
    pub expiry_date: NaiveDate,
    pub anchor: Anchor,
    pub state: SummaryState,
    pub as_of_date: NaiveDate,
    /// `None` when a closed summary was left as stored.
    pub partition: Option<PartitionInfo>,
}

/// Everything a run wrote, warned about and failed on. Serialized as the run manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub symbols: Vec<String>,
    pub gold: Vec<PartitionInfo>,
    pub summaries: Vec<SummaryOutcome>,
    pub warnings: Vec<BuildWarning>,
    pub failures: Vec<UnitFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_count(&self, kind: FailureKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}
