// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use core_types::{
    config::AppConfig, Anchor, BuildWarning, ExpiryWindow, FailureKind, Table,
    YearMonth,
};
use expiry_service::{ExpiryRule, ExpiryService, ObservedExpiryLog, WindowResolution};
use gold_builder::{GoldBuilder, GoldError};
use log::{debug, error, info};
use partition_store::PartitionStore;
use summary_builder::{SummaryBuilder, SummaryDisposition, SummaryOptions};

use crate::{
    error::PipelineError,
    report::{RunReport, SummaryOutcome, UnitFailure},
};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub rule: ExpiryRule,
    /// Days before the run start scanned for observed expiries.
    pub lookback_days: u32,
    pub summary: SummaryOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rule: ExpiryRule::default(),
            lookback_days: 120,
            summary: SummaryOptions::default(),
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            rule: ExpiryRule::new(
                config.expiry.weekday()?,
                config.expiry.holidays.iter().copied(),
                config.expiry.cycle_days,
            ),
            lookback_days: config.expiry.lookback_days,
            summary: SummaryOptions {
                rebuild_closed: config.summary.rebuild_closed,
            },
        })
    }
}

/// Gold then summary builds over a date range. Every unit of work is
/// independent: failures are collected and the range continues.
pub struct Pipeline {
    store: PartitionStore,
    options: PipelineOptions,
}

/// A summary to rebuild, keyed by (symbol, expiry) in `Pipeline::run`.
struct PendingSummary {
    anchor: Anchor,
    window: ExpiryWindow,
    warnings: Vec<BuildWarning>,
}

impl Pipeline {
    pub fn new(store: PartitionStore, options: PipelineOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &PartitionStore {
        &self.store
    }

    /// Rebuilds gold rows for `start..=end` and every summary whose cycle
    /// contains a rebuilt day. An empty `symbols` slice means every symbol in
    /// each day's silver data.
    pub fn run(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunReport, PipelineError> {
        if start > end {
            return Err(PipelineError::InvalidRange { start, end });
        }
        let started_at = Utc::now();
        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        let mut gold = Vec::new();
        let mut built: Vec<(String, NaiveDate)> = Vec::new();

        info!(
            "run {}..={} for {}",
            start,
            end,
            if symbols.is_empty() {
                "all symbols".to_string()
            } else {
                symbols.join(",")
            }
        );

        let silver_dates: BTreeSet<NaiveDate> = self
            .store
            .list_keys(Table::FoBhavcopyDay, None)?
            .into_iter()
            .map(|key| key.date)
            .filter(|date| *date >= start && *date <= end)
            .collect();
        let builder = GoldBuilder::new(&self.store);
        for date in days(start, end) {
            if !silver_dates.contains(&date) {
                if self.options.rule.is_trading_weekday(date) {
                    let err = GoldError::MissingPartition {
                        table: Table::FoBhavcopyDay,
                        date,
                    };
                    push_failure(&mut failures, format!("gold {date}"), err.kind(), &err);
                } else {
                    debug!("skipping non-trading day {}", date);
                }
                continue;
            }
            let results = match builder.build_date(date, symbols) {
                Ok(results) => results,
                Err(err) => {
                    push_failure(&mut failures, format!("gold {date}"), err.kind(), &err);
                    continue;
                }
            };
            for (symbol, result) in results {
                match result {
                    Ok(build) => {
                        gold.push(build.partition);
                        warnings.extend(build.warnings);
                        built.push((symbol, date));
                    }
                    Err(err) => push_failure(
                        &mut failures,
                        format!("gold {symbol} {date}"),
                        err.kind(),
                        &err,
                    ),
                }
            }
        }

        let mut scanned: BTreeSet<String> = symbols.iter().cloned().collect();
        scanned.extend(built.iter().map(|(symbol, _)| symbol.clone()));
        let mut expiries = self.expiry_service(&scanned, start, end, &mut failures)?;

        let mut pending: BTreeMap<(String, NaiveDate), PendingSummary> = BTreeMap::new();
        let mut window_failures = BTreeSet::new();
        for (symbol, date) in &built {
            let impacted = expiries.impacted_expiries(symbol, *date);
            for expiry in impacted.expiries {
                pending
                    .entry((symbol.clone(), expiry.expiry_date))
                    .or_insert(PendingSummary {
                        anchor: expiry.anchor,
                        window: expiry.window,
                        warnings: expiry.warnings,
                    });
            }
            for failed in impacted.failed {
                let unit = format!("window {} {}", failed.symbol, failed.month);
                if window_failures.insert(unit.clone()) {
                    push_failure(&mut failures, unit, failed.error.kind(), &failed.error);
                }
            }
        }

        let summary_builder = SummaryBuilder::new(&self.store, self.options.summary);
        let mut summaries = Vec::new();
        for ((symbol, expiry_date), job) in pending {
            warnings.extend(job.warnings);
            match summary_builder.build_summary(&expiries, &job.window, job.anchor) {
                Ok(build) => {
                    warnings.extend(build.warnings);
                    summaries.push(SummaryOutcome {
                        symbol,
                        expiry_date,
                        anchor: job.anchor,
                        state: build.row.state,
                        as_of_date: build.row.as_of_date,
                        partition: match build.disposition {
                            SummaryDisposition::Written(info) => Some(info),
                            SummaryDisposition::UnchangedClosed => None,
                        },
                    });
                }
                Err(err) => push_failure(
                    &mut failures,
                    format!("summary {} {} {}", symbol, job.anchor, expiry_date),
                    err.kind(),
                    &err,
                ),
            }
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            start,
            end,
            symbols: symbols.to_vec(),
            gold,
            summaries,
            warnings: dedupe(warnings),
            failures,
        };
        info!(
            "run {}..={} finished: {} gold partitions, {} summaries, {} warnings, {} failures",
            start,
            end,
            report.gold.len(),
            report.summaries.len(),
            report.warnings.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Resolves the W1/W3 window for `symbol` in `month` from silver observed
    /// over the configured lookback ending at the month's last day.
    pub fn resolve_window(
        &self,
        symbol: &str,
        month: YearMonth,
    ) -> Result<WindowResolution, PipelineError> {
        let symbols: BTreeSet<String> = [symbol.to_string()].into_iter().collect();
        let mut failures = Vec::new();
        let mut expiries =
            self.expiry_service(&symbols, month.first_day(), month.last_day(), &mut failures)?;
        Ok(expiries.resolve_window(symbol, month)?)
    }

    fn expiry_service(
        &self,
        symbols: &BTreeSet<String>,
        start: NaiveDate,
        end: NaiveDate,
        failures: &mut Vec<UnitFailure>,
    ) -> Result<ExpiryService, PipelineError> {
        let from = start - Duration::days(i64::from(self.options.lookback_days));
        let outcome = ObservedExpiryLog::scan_silver(&self.store, symbols, from, end)?;
        for rejected in outcome.rejected {
            failures.push(UnitFailure {
                unit: format!(
                    "observed_expiry {} {}@{}",
                    rejected.observation.symbol,
                    rejected.observation.expiry_date,
                    rejected.observation.first_seen_date
                ),
                kind: FailureKind::DataConsistency,
                message: rejected.reason,
            });
        }
        Ok(ExpiryService::new(self.options.rule.clone(), outcome.log))
    }
}

fn push_failure(
    failures: &mut Vec<UnitFailure>,
    unit: String,
    kind: FailureKind,
    err: &dyn std::error::Error,
) {
    error!("{} failed: {}", unit, err);
    failures.push(UnitFailure {
        unit,
        kind,
        message: err.to_string(),
    });
}

fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}

fn dedupe(warnings: Vec<BuildWarning>) -> Vec<BuildWarning> {
    let mut seen = HashSet::new();
    warnings
        .into_iter()
        .filter(|warning| seen.insert(warning.clone()))
        .collect()
}
