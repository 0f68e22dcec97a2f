// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use core_types::{BuildWarning, FoBhavcopyRow, GoldRow, Table};

use crate::{error::GoldError, silver::MwplLookup};

/// Derives the gold row for `symbol` on `date` from that date's silver rows only.
pub fn compute_gold_row(
    symbol: &str,
    date: NaiveDate,
    futures: &[&FoBhavcopyRow],
    mwpl: MwplLookup<'_>,
) -> Result<(GoldRow, Vec<BuildWarning>), GoldError> {
    let contracts = dedupe_contracts(symbol, date, futures)?;
    let Some((near_expiry, near)) = contracts.iter().next().map(|(e, row)| (*e, *row)) else {
        return Err(GoldError::MissingSymbol {
            table: Table::FoBhavcopyDay,
            symbol: symbol.to_string(),
            date,
        });
    };
    if near_expiry < date {
        return Err(GoldError::DataConsistency {
            symbol: symbol.to_string(),
            date,
            message: format!("contract expiring {near_expiry} still listed"),
        });
    }

    let mut total_contracts_traded = 0;
    let mut total_value_lakhs = 0.0;
    let mut total_oi_contracts = 0;
    let mut total_oi_shares = 0;
    let mut total_change = Some(0);
    let mut lot_size_mismatch = false;
    for row in contracts.values() {
        total_contracts_traded += row.contracts;
        total_value_lakhs += row.value_lakhs;
        total_oi_contracts += row.open_interest_contracts;
        total_oi_shares += row.open_interest_contracts * row.lot_size_shares;
        total_change = total_change.zip(row.change_in_oi_contracts).map(|(a, b)| a + b);
        lot_size_mismatch |= row.lot_size_shares != near.lot_size_shares;
    }

    let mut warnings = Vec::new();
    let (mwpl_shares, combined_oi_shares, mwpl_utilisation_pct, mwpl_missing) = match mwpl {
        MwplLookup::Found(row) => {
            let utilisation = (row.mwpl_shares > 0)
                .then(|| row.combined_oi_shares as f64 * 100.0 / row.mwpl_shares as f64);
            (
                Some(row.mwpl_shares),
                Some(row.combined_oi_shares),
                utilisation,
                false,
            )
        }
        MwplLookup::PartitionMissing | MwplLookup::SymbolMissing => {
            let detail = if mwpl == MwplLookup::PartitionMissing {
                "MWPL partition missing"
            } else {
                "no MWPL row for symbol"
            };
            warnings.push(BuildWarning::EnrichmentMissing {
                symbol: symbol.to_string(),
                from: date,
                through: date,
                detail: detail.to_string(),
            });
            (None, None, None, true)
        }
    };

    let row = GoldRow {
        symbol: symbol.to_string(),
        trade_date: date,
        contract_count: contracts.len() as u32,
        near_expiry,
        near_close: near.close,
        near_settle_price: near.settle_price,
        total_contracts_traded,
        total_value_lakhs,
        total_oi_contracts,
        total_change_in_oi_contracts: total_change,
        lot_size_shares: near.lot_size_shares,
        lot_size_mismatch,
        total_oi_shares,
        mwpl_shares,
        combined_oi_shares,
        mwpl_utilisation_pct,
        mwpl_missing,
    };
    Ok((row, warnings))
}

/// One row per expiry, ordered by expiry. Identical duplicates collapse.
fn dedupe_contracts<'a>(
    symbol: &str,
    date: NaiveDate,
    futures: &[&'a FoBhavcopyRow],
) -> Result<BTreeMap<NaiveDate, &'a FoBhavcopyRow>, GoldError> {
    let mut contracts: BTreeMap<NaiveDate, &FoBhavcopyRow> = BTreeMap::new();
    for &row in futures {
        if row.trade_date != date {
            return Err(GoldError::DataConsistency {
                symbol: symbol.to_string(),
                date,
                message: format!("row dated {} in partition for {}", row.trade_date, date),
            });
        }
        match contracts.get(&row.expiry_date) {
            Some(&existing) if existing != row => {
                return Err(GoldError::DataConsistency {
                    symbol: symbol.to_string(),
                    date,
                    message: format!("conflicting rows for expiry {}", row.expiry_date),
                });
            }
            Some(_) => {}
            None => {
                contracts.insert(row.expiry_date, row);
            }
        }
    }
    Ok(contracts)
}
