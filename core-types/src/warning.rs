// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::month::YearMonth;

/// Field of an expiry resolution that fell back to the calendar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackField {
    W1,
    W3,
    CycleStart,
}

impl fmt::Display for FallbackField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackField::W1 => "w1",
            FallbackField::W3 => "w3",
            FallbackField::CycleStart => "cycle_start",
        })
    }
}

/// Non-fatal conditions attached to built rows and run manifests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildWarning {
    /// The expiry calendar rule stood in for observed data.
    HeuristicFallback {
        symbol: String,
        month: YearMonth,
        field: FallbackField,
        date: NaiveDate,
    },
    /// MWPL data was unavailable for some or all of a date range.
    EnrichmentMissing {
        symbol: String,
        from: NaiveDate,
        through: NaiveDate,
        detail: String,
    },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::HeuristicFallback {
                symbol,
                month,
                field,
                date,
            } => write!(
                f,
                "{symbol} {month}: {field} defaulted to calendar rule ({date})"
            ),
            BuildWarning::EnrichmentMissing {
                symbol,
                from,
                through,
                detail,
            } => {
                if from == through {
                    write!(f, "{symbol} {from}: {detail}")
                } else {
                    write!(f, "{symbol} {from}..={through}: {detail}")
                }
            }
        }
    }
}

/// Classification of a failed unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingInput,
    DataConsistency,
    Storage,
}
