// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::month::YearMonth;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// One futures contract line of the normalized bhavcopy (silver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoBhavcopyRow {
    pub trade_date: NaiveDate,
    pub instrument: String,
    pub symbol: String,
    pub expiry_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub settle_price: f64,
    pub contracts: i64,
    pub value_lakhs: f64,
    pub open_interest_contracts: i64,
    pub lot_size_shares: i64,
    pub change_in_oi_contracts: Option<i64>,
}

/// Combined open interest against the market-wide position limit (silver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MwplRow {
    pub trade_date: NaiveDate,
    pub symbol: String,
    pub mwpl_shares: i64,
    pub combined_oi_shares: i64,
}

/// A contract expiry seen in silver data, with the first trade date it appeared on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservedExpiry {
    pub symbol: String,
    pub expiry_date: NaiveDate,
    pub first_seen_date: NaiveDate,
}

/// The two monthly expiry anchors summaries are keyed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    W1,
    W3,
}

impl Anchor {
    pub const BOTH: [Anchor; 2] = [Anchor::W1, Anchor::W3];

    /// Ordinal of the anchor among the month's distinct expiries.
    pub fn ordinal(&self) -> usize {
        match self {
            Anchor::W1 => 1,
            Anchor::W3 => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Anchor::W1 => "w1",
            Anchor::W3 => "w3",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Anchor {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "w1" => Ok(Anchor::W1),
            "w3" => Ok(Anchor::W3),
            other => Err(ParseEnumError {
                kind: "anchor",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirySource {
    Observed,
    Heuristic,
}

impl ExpirySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirySource::Observed => "observed",
            ExpirySource::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for ExpirySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpirySource {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "observed" => Ok(ExpirySource::Observed),
            "heuristic" => Ok(ExpirySource::Heuristic),
            other => Err(ParseEnumError {
                kind: "expiry source",
                value: other.to_string(),
            }),
        }
    }
}

/// Resolved W1/W3 anchors for a symbol and month.
///
/// Invariants: `w1_date < w3_date`, both fall inside `month`, and an
/// `Observed` source means the date exists in the observed-expiry log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryWindow {
    pub symbol: String,
    pub month: YearMonth,
    pub w1_date: NaiveDate,
    pub w3_date: NaiveDate,
    pub w1_source: ExpirySource,
    pub w3_source: ExpirySource,
}

impl ExpiryWindow {
    pub fn date(&self, anchor: Anchor) -> NaiveDate {
        match anchor {
            Anchor::W1 => self.w1_date,
            Anchor::W3 => self.w3_date,
        }
    }

    pub fn source(&self, anchor: Anchor) -> ExpirySource {
        match anchor {
            Anchor::W1 => self.w1_source,
            Anchor::W3 => self.w3_source,
        }
    }
}

/// Per-symbol, per-date features derived from one day of silver data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldRow {
    pub symbol: String,
    pub trade_date: NaiveDate,
    pub contract_count: u32,
    pub near_expiry: NaiveDate,
    pub near_close: f64,
    pub near_settle_price: f64,
    pub total_contracts_traded: i64,
    pub total_value_lakhs: f64,
    pub total_oi_contracts: i64,
    pub total_change_in_oi_contracts: Option<i64>,
    pub lot_size_shares: i64,
    pub lot_size_mismatch: bool,
    pub total_oi_shares: i64,
    pub mwpl_shares: Option<i64>,
    pub combined_oi_shares: Option<i64>,
    pub mwpl_utilisation_pct: Option<f64>,
    pub mwpl_missing: bool,
}

/// Lifecycle of a summary relative to its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryState {
    /// The window is still in progress (`as_of_date < expiry_date`).
    Open,
    /// The window reached its expiry.
    Closed,
}

impl SummaryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryState::Open => "open",
            SummaryState::Closed => "closed",
        }
    }
}

impl fmt::Display for SummaryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryState {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(SummaryState::Open),
            "closed" => Ok(SummaryState::Closed),
            other => Err(ParseEnumError {
                kind: "summary state",
                value: other.to_string(),
            }),
        }
    }
}

/// Aggregate over one expiry cycle for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub symbol: String,
    pub expiry_date: NaiveDate,
    pub anchor: Anchor,
    pub anchor_source: ExpirySource,
    pub cycle_start: NaiveDate,
    pub as_of_date: NaiveDate,
    pub state: SummaryState,
    pub trading_days: u32,
    pub first_trade_date: NaiveDate,
    pub total_contracts_traded: i64,
    pub total_value_lakhs: f64,
    pub open_oi_contracts: i64,
    pub close_oi_contracts: i64,
    pub oi_change_contracts: i64,
    pub max_oi_contracts: i64,
    pub max_oi_date: NaiveDate,
    pub mwpl_shares_used: Option<i64>,
    pub lot_size_used: Option<i64>,
    pub max_permitted_contracts: Option<i64>,
    pub threshold_90pct: Option<i64>,
    pub mwpl_asof_date: Option<NaiveDate>,
    pub peak_oi_utilisation_pct: Option<f64>,
    pub days_above_threshold: Option<u32>,
    pub mwpl_carried_days: u32,
}
