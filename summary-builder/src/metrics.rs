// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::NaiveDate;
use core_types::{Anchor, BuildWarning, ExpiryWindow, GoldRow, SummaryRow, SummaryState};

use crate::locf::{MwplIndex, MwplObservation};

/// Everything a summary is reduced from. `days` must be the symbol's gold rows
/// dated `cycle_start..=as_of_date`, ascending and non-empty.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInput<'a> {
    pub window: &'a ExpiryWindow,
    pub anchor: Anchor,
    pub cycle_start: NaiveDate,
    pub as_of_date: NaiveDate,
    pub days: &'a [GoldRow],
}

struct Limits {
    max_permitted: i64,
    threshold: i64,
}

fn limits(observation: &MwplObservation) -> Option<Limits> {
    if observation.lot_size_shares <= 0 || observation.mwpl_shares < 0 {
        return None;
    }
    let max_permitted = observation.mwpl_shares / observation.lot_size_shares;
    Some(Limits {
        max_permitted,
        threshold: max_permitted * 9 / 10,
    })
}

fn utilisation_pct(oi_shares: i64, observation: &MwplObservation) -> Option<f64> {
    (observation.mwpl_shares > 0)
        .then(|| oi_shares as f64 * 100.0 / observation.mwpl_shares as f64)
}

/// Pure reduction of a window of gold rows into a summary row.
///
/// MWPL figures for each day come from the latest observation at or before
/// that day within the window. Returns `None` for an empty `days` slice.
pub fn compute_summary(input: SummaryInput<'_>) -> Option<(SummaryRow, Vec<BuildWarning>)> {
    let first = input.days.first()?;
    let last = input.days.last()?;
    let symbol = input.window.symbol.clone();
    let expiry_date = input.window.date(input.anchor);
    let index = MwplIndex::from_gold(input.days);

    let mut total_contracts_traded = 0;
    let mut total_value_lakhs = 0.0;
    let mut max_oi = (first.total_oi_contracts, first.trade_date);
    let mut peak_utilisation: Option<f64> = None;
    let mut days_above = 0u32;
    let mut carried = 0u32;
    for day in input.days {
        total_contracts_traded += day.total_contracts_traded;
        total_value_lakhs += day.total_value_lakhs;
        if day.total_oi_contracts > max_oi.0 {
            max_oi = (day.total_oi_contracts, day.trade_date);
        }
        let Some((observed_on, observation)) = index.asof(day.trade_date) else {
            continue;
        };
        if observed_on < day.trade_date {
            carried += 1;
        }
        if let Some(pct) = utilisation_pct(day.total_oi_shares, observation) {
            peak_utilisation = Some(peak_utilisation.map_or(pct, |peak| peak.max(pct)));
        }
        if let Some(limits) = limits(observation) {
            if day.total_oi_contracts > limits.threshold {
                days_above += 1;
            }
        }
    }

    let mut warnings = Vec::new();
    match index.first_date() {
        None => warnings.push(BuildWarning::EnrichmentMissing {
            symbol: symbol.clone(),
            from: first.trade_date,
            through: last.trade_date,
            detail: format!("no MWPL observation in window for expiry {expiry_date}"),
        }),
        Some(first_observed) if first_observed > first.trade_date => {
            let through = input
                .days
                .iter()
                .take_while(|day| day.trade_date < first_observed)
                .last()
                .map_or(first.trade_date, |day| day.trade_date);
            warnings.push(BuildWarning::EnrichmentMissing {
                symbol: symbol.clone(),
                from: first.trade_date,
                through,
                detail: format!("MWPL metrics unavailable before {first_observed}"),
            });
        }
        Some(_) => {}
    }

    let used = index.asof(input.as_of_date);
    let used_limits = used.and_then(|(_, observation)| limits(observation));
    let row = SummaryRow {
        symbol,
        expiry_date,
        anchor: input.anchor,
        anchor_source: input.window.source(input.anchor),
        cycle_start: input.cycle_start,
        as_of_date: input.as_of_date,
        state: if input.as_of_date >= expiry_date {
            SummaryState::Closed
        } else {
            SummaryState::Open
        },
        trading_days: input.days.len() as u32,
        first_trade_date: first.trade_date,
        total_contracts_traded,
        total_value_lakhs,
        open_oi_contracts: first.total_oi_contracts,
        close_oi_contracts: last.total_oi_contracts,
        oi_change_contracts: last.total_oi_contracts - first.total_oi_contracts,
        max_oi_contracts: max_oi.0,
        max_oi_date: max_oi.1,
        mwpl_shares_used: used.map(|(_, observation)| observation.mwpl_shares),
        lot_size_used: used.map(|(_, observation)| observation.lot_size_shares),
        max_permitted_contracts: used_limits.as_ref().map(|l| l.max_permitted),
        threshold_90pct: used_limits.as_ref().map(|l| l.threshold),
        mwpl_asof_date: used.map(|(date, _)| date),
        peak_oi_utilisation_pct: peak_utilisation,
        days_above_threshold: (!index.is_empty()).then_some(days_above),
        mwpl_carried_days: carried,
    };
    Some((row, warnings))
}
