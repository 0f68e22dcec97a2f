// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::HashMap;

use chrono::NaiveDate;
use core_types::{
    Anchor, BuildWarning, ExpirySource, ExpiryWindow, FallbackField, ObservedExpiry, YearMonth,
};
use log::{debug, warn};
use serde::Serialize;

use crate::{calendar::ExpiryRule, error::ExpiryError, observed::ObservedExpiryLog};

/// A resolved window plus the fallbacks taken to produce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowResolution {
    pub window: ExpiryWindow,
    pub warnings: Vec<BuildWarning>,
}

impl WindowResolution {
    /// Warnings concerning one anchor of the window.
    pub fn warnings_for(&self, anchor: Anchor) -> Vec<BuildWarning> {
        let field = match anchor {
            Anchor::W1 => FallbackField::W1,
            Anchor::W3 => FallbackField::W3,
        };
        self.warnings
            .iter()
            .filter(|warning| {
                matches!(warning, BuildWarning::HeuristicFallback { field: f, .. } if *f == field)
            })
            .cloned()
            .collect()
    }
}

/// An anchor expiry whose cycle contains a given trade date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpactedExpiry {
    pub anchor: Anchor,
    pub expiry_date: NaiveDate,
    pub window: ExpiryWindow,
    pub warnings: Vec<BuildWarning>,
}

/// A month whose window could not be resolved while looking up impacted expiries.
#[derive(Debug)]
pub struct WindowFailure {
    pub symbol: String,
    pub month: YearMonth,
    pub error: ExpiryError,
}

/// Impacted anchors of a trade date. Months that fail to resolve are reported
/// in `failed` and do not hide anchors from months that resolved.
#[derive(Debug, Default)]
pub struct ImpactedExpiries {
    pub expiries: Vec<ImpactedExpiry>,
    pub failed: Vec<WindowFailure>,
}

/// Resolves W1/W3 windows from an observed-expiry log scoped to one run.
///
/// Results are memoized per (symbol, month) for the life of the service only;
/// recording a new expiry drops the affected entry.
#[derive(Debug)]
pub struct ExpiryService {
    rule: ExpiryRule,
    log: ObservedExpiryLog,
    cache: HashMap<(String, YearMonth), WindowResolution>,
}

impl ExpiryService {
    pub fn new(rule: ExpiryRule, log: ObservedExpiryLog) -> Self {
        Self {
            rule,
            log,
            cache: HashMap::new(),
        }
    }

    pub fn rule(&self) -> &ExpiryRule {
        &self.rule
    }

    pub fn log(&self) -> &ObservedExpiryLog {
        &self.log
    }

    /// Appends to the log and invalidates the cached window the expiry falls in.
    pub fn observe(&mut self, observation: &ObservedExpiry) -> Result<bool, ExpiryError> {
        let added = self.log.record(observation)?;
        if added {
            self.invalidate(&observation.symbol, YearMonth::of(observation.expiry_date));
        }
        Ok(added)
    }

    pub fn invalidate(&mut self, symbol: &str, month: YearMonth) {
        self.cache.remove(&(symbol.to_string(), month));
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn resolve_window(
        &mut self,
        symbol: &str,
        month: YearMonth,
    ) -> Result<WindowResolution, ExpiryError> {
        let cache_key = (symbol.to_string(), month);
        if let Some(resolution) = self.cache.get(&cache_key) {
            return Ok(resolution.clone());
        }
        let resolution = self.compute_window(symbol, month)?;
        for warning in &resolution.warnings {
            warn!("{}", warning);
        }
        self.cache.insert(cache_key, resolution.clone());
        Ok(resolution)
    }

    fn compute_window(
        &self,
        symbol: &str,
        month: YearMonth,
    ) -> Result<WindowResolution, ExpiryError> {
        let observed = self.log.expiries_in(symbol, month);
        let mut warnings = Vec::new();
        let (w1_date, w1_source) =
            self.pick(symbol, month, &observed, Anchor::W1, &mut warnings)?;
        let (w3_date, w3_source) =
            self.pick(symbol, month, &observed, Anchor::W3, &mut warnings)?;
        if w1_date >= w3_date {
            return Err(ExpiryError::DataConsistency {
                symbol: symbol.to_string(),
                month,
                message: format!(
                    "w1 {} ({}) is not before w3 {} ({})",
                    w1_date, w1_source, w3_date, w3_source
                ),
            });
        }
        debug!(
            "resolved {} {}: w1 {} ({}), w3 {} ({})",
            symbol, month, w1_date, w1_source, w3_date, w3_source
        );
        Ok(WindowResolution {
            window: ExpiryWindow {
                symbol: symbol.to_string(),
                month,
                w1_date,
                w3_date,
                w1_source,
                w3_source,
            },
            warnings,
        })
    }

    fn pick(
        &self,
        symbol: &str,
        month: YearMonth,
        observed: &[NaiveDate],
        anchor: Anchor,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<(NaiveDate, ExpirySource), ExpiryError> {
        let ordinal = anchor.ordinal();
        if let Some(date) = observed.get(ordinal - 1) {
            return Ok((*date, ExpirySource::Observed));
        }
        let date = self
            .rule
            .expected_expiry(month, ordinal)
            .ok_or(ExpiryError::Calendar { month, ordinal })?;
        warnings.push(BuildWarning::HeuristicFallback {
            symbol: symbol.to_string(),
            month,
            field: match anchor {
                Anchor::W1 => FallbackField::W1,
                Anchor::W3 => FallbackField::W3,
            },
            date,
        });
        Ok((date, ExpirySource::Heuristic))
    }

    /// First day of the cycle ending at `expiry`: the day after the previous
    /// observed expiry, or the calendar rule's cycle length when none is known.
    pub fn cycle_start(
        &self,
        symbol: &str,
        expiry: NaiveDate,
    ) -> (NaiveDate, Option<BuildWarning>) {
        if let Some(start) = self
            .log
            .previous_expiry(symbol, expiry)
            .and_then(|previous| previous.succ_opt())
        {
            return (start, None);
        }
        let start = self.rule.default_cycle_start(expiry);
        let warning = BuildWarning::HeuristicFallback {
            symbol: symbol.to_string(),
            month: YearMonth::of(expiry),
            field: FallbackField::CycleStart,
            date: start,
        };
        (start, Some(warning))
    }

    /// Anchors of `date`'s month and the following month whose cycle contains
    /// `date`. Each month resolves on its own.
    pub fn impacted_expiries(&mut self, symbol: &str, date: NaiveDate) -> ImpactedExpiries {
        let month = YearMonth::of(date);
        let mut impacted = ImpactedExpiries::default();
        for month in std::iter::once(month).chain(month.succ()) {
            let resolution = match self.resolve_window(symbol, month) {
                Ok(resolution) => resolution,
                Err(error) => {
                    impacted.failed.push(WindowFailure {
                        symbol: symbol.to_string(),
                        month,
                        error,
                    });
                    continue;
                }
            };
            for anchor in Anchor::BOTH {
                let expiry = resolution.window.date(anchor);
                if expiry < date {
                    continue;
                }
                let (start, _) = self.cycle_start(symbol, expiry);
                if start <= date {
                    impacted.expiries.push(ImpactedExpiry {
                        anchor,
                        expiry_date: expiry,
                        window: resolution.window.clone(),
                        warnings: resolution.warnings_for(anchor),
                    });
                }
            }
        }
        impacted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn june(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn june_month() -> YearMonth {
        YearMonth::new(2024, 6).unwrap()
    }

    fn service_with(symbol: &str, expiries: &[NaiveDate]) -> ExpiryService {
        let mut log = ObservedExpiryLog::new();
        for expiry in expiries {
            log.record(&ObservedExpiry {
                symbol: symbol.to_string(),
                expiry_date: *expiry,
                first_seen_date: june(1),
            })
            .unwrap();
        }
        ExpiryService::new(ExpiryRule::default(), log)
    }

    #[test]
    fn ranks_first_and_third_observed_expiry() {
        let mut service = service_with("NIFTY", &[june(26), june(5), june(19), june(12)]);
        let resolution = service.resolve_window("NIFTY", june_month()).unwrap();
        assert_eq!(resolution.window.w1_date, june(5));
        assert_eq!(resolution.window.w3_date, june(19));
        assert_eq!(resolution.window.w1_source, ExpirySource::Observed);
        assert_eq!(resolution.window.w3_source, ExpirySource::Observed);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn falls_back_to_calendar_for_missing_third_expiry() {
        let mut service = service_with("NIFTY", &[june(5), june(12)]);
        let resolution = service.resolve_window("NIFTY", june_month()).unwrap();
        assert_eq!(resolution.window.w1_source, ExpirySource::Observed);
        assert_eq!(resolution.window.w3_source, ExpirySource::Heuristic);
        assert_eq!(resolution.window.w3_date, june(19));
        assert_eq!(
            resolution.warnings,
            vec![BuildWarning::HeuristicFallback {
                symbol: "NIFTY".to_string(),
                month: june_month(),
                field: FallbackField::W3,
                date: june(19),
            }]
        );
        assert!(resolution.warnings_for(Anchor::W1).is_empty());
        assert_eq!(resolution.warnings_for(Anchor::W3).len(), 1);
    }

    #[test]
    fn both_anchors_heuristic_without_observations() {
        let mut service = service_with("NIFTY", &[]);
        let resolution = service.resolve_window("NIFTY", june_month()).unwrap();
        assert_eq!(resolution.window.w1_date, june(5));
        assert_eq!(resolution.window.w3_date, june(19));
        assert_eq!(resolution.warnings.len(), 2);
    }

    #[test]
    fn inverted_window_is_a_consistency_error() {
        let mut service = service_with("NIFTY", &[june(26)]);
        let err = service.resolve_window("NIFTY", june_month()).unwrap_err();
        match err {
            ExpiryError::DataConsistency { symbol, month, .. } => {
                assert_eq!(symbol, "NIFTY");
                assert_eq!(month, june_month());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cache_is_invalidated_by_new_observations() {
        let mut service = service_with("NIFTY", &[june(5), june(12)]);
        let first = service.resolve_window("NIFTY", june_month()).unwrap();
        assert_eq!(first.window.w3_source, ExpirySource::Heuristic);

        let added = service
            .observe(&ObservedExpiry {
                symbol: "NIFTY".to_string(),
                expiry_date: june(20),
                first_seen_date: june(3),
            })
            .unwrap();
        assert!(added);
        let second = service.resolve_window("NIFTY", june_month()).unwrap();
        assert_eq!(second.window.w3_date, june(20));
        assert_eq!(second.window.w3_source, ExpirySource::Observed);
    }

    #[test]
    fn cycle_start_follows_previous_observed_expiry() {
        let service = service_with("NIFTY", &[june(5), june(12), june(19)]);
        assert_eq!(service.cycle_start("NIFTY", june(19)), (june(13), None));

        let (start, warning) = service.cycle_start("NIFTY", june(5));
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 5, 30).unwrap());
        assert!(matches!(
            warning,
            Some(BuildWarning::HeuristicFallback {
                field: FallbackField::CycleStart,
                ..
            })
        ));
    }

    #[test]
    fn impacted_expiries_cover_month_boundary() {
        let july = |d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
        let mut log = ObservedExpiryLog::new();
        for expiry in [june(5), june(12), june(19), june(26), july(3), july(10), july(17)] {
            log.record(&ObservedExpiry {
                symbol: "NIFTY".to_string(),
                expiry_date: expiry,
                first_seen_date: june(1),
            })
            .unwrap();
        }
        let mut service = ExpiryService::new(ExpiryRule::new(Weekday::Wed, [], 7), log);

        let impacted = service.impacted_expiries("NIFTY", june(17)).expiries;
        assert_eq!(impacted.len(), 1);
        assert_eq!(impacted[0].anchor, Anchor::W3);
        assert_eq!(impacted[0].expiry_date, june(19));

        let impacted = service.impacted_expiries("NIFTY", june(27));
        assert!(impacted.failed.is_empty());
        assert_eq!(impacted.expiries.len(), 1);
        assert_eq!(impacted.expiries[0].anchor, Anchor::W1);
        assert_eq!(impacted.expiries[0].expiry_date, july(3));

        assert!(service.impacted_expiries("NIFTY", june(24)).expiries.is_empty());
    }

    #[test]
    fn failing_next_month_keeps_current_month_anchors() {
        let july = |d| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
        let mut service = service_with("NIFTY", &[june(5), june(12), june(19), june(26), july(31)]);

        let impacted = service.impacted_expiries("NIFTY", june(3));
        assert_eq!(impacted.expiries.len(), 1);
        assert_eq!(impacted.expiries[0].anchor, Anchor::W1);
        assert_eq!(impacted.expiries[0].expiry_date, june(5));

        assert_eq!(impacted.failed.len(), 1);
        let failure = &impacted.failed[0];
        assert_eq!(failure.symbol, "NIFTY");
        assert_eq!(failure.month, YearMonth::new(2024, 7).unwrap());
        assert!(matches!(failure.error, ExpiryError::DataConsistency { .. }));
    }
}
