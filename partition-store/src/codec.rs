// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{cmp::Ordering, str::FromStr, sync::Arc};

use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
        UInt32Array,
    },
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use core_types::{
    schema::{date_to_days, schema_for},
    FoBhavcopyRow, GoldRow, MwplRow, SummaryRow, Table,
};

use crate::error::StoreError;

/// A row type stored in exactly one table.
pub trait PartitionRecord: Sized + Clone {
    const TABLE: Table;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, StoreError>;

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError>;

    /// Total order used before encoding; equal row sets must encode to equal bytes.
    fn cmp_rows(a: &Self, b: &Self) -> Ordering;
}

fn batch(table: Table, arrays: Vec<ArrayRef>) -> Result<RecordBatch, StoreError> {
    Ok(RecordBatch::try_new(schema_for(table), arrays)?)
}

fn column<'a, A: Array + 'static>(
    table: Table,
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a A, StoreError> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::schema(table, format!("missing column {name}")))?;
    array.as_any().downcast_ref::<A>().ok_or_else(|| {
        StoreError::schema(
            table,
            format!("column {name} has unexpected type {}", array.data_type()),
        )
    })
}

fn date_at(table: Table, array: &Date32Array, idx: usize) -> Result<NaiveDate, StoreError> {
    array
        .value_as_date(idx)
        .ok_or_else(|| StoreError::schema(table, format!("date out of range at row {idx}")))
}

fn opt_date_at(
    table: Table,
    array: &Date32Array,
    idx: usize,
) -> Result<Option<NaiveDate>, StoreError> {
    if array.is_null(idx) {
        Ok(None)
    } else {
        date_at(table, array, idx).map(Some)
    }
}

fn opt_i64_at(array: &Int64Array, idx: usize) -> Option<i64> {
    (!array.is_null(idx)).then(|| array.value(idx))
}

fn opt_f64_at(array: &Float64Array, idx: usize) -> Option<f64> {
    (!array.is_null(idx)).then(|| array.value(idx))
}

fn opt_u32_at(array: &UInt32Array, idx: usize) -> Option<u32> {
    (!array.is_null(idx)).then(|| array.value(idx))
}

fn parse_at<T: FromStr>(table: Table, array: &StringArray, idx: usize) -> Result<T, StoreError>
where
    T::Err: std::fmt::Display,
{
    array
        .value(idx)
        .parse()
        .map_err(|err: T::Err| StoreError::schema(table, format!("row {idx}: {err}")))
}

impl PartitionRecord for FoBhavcopyRow {
    const TABLE: Table = Table::FoBhavcopyDay;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, StoreError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.trade_date)),
            )),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.instrument.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.symbol.as_str()))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.expiry_date)),
            )),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.open))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.high))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.low))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.close))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.settle_price))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.contracts))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.value_lakhs))),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.open_interest_contracts),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.lot_size_shares))),
            Arc::new(Int64Array::from(
                rows.iter()
                    .map(|r| r.change_in_oi_contracts)
                    .collect::<Vec<_>>(),
            )),
        ];
        batch(Self::TABLE, arrays)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError> {
        let t = Self::TABLE;
        let trade_date = column::<Date32Array>(t, batch, "trade_date")?;
        let instrument = column::<StringArray>(t, batch, "instrument")?;
        let symbol = column::<StringArray>(t, batch, "symbol")?;
        let expiry_date = column::<Date32Array>(t, batch, "expiry_date")?;
        let open = column::<Float64Array>(t, batch, "open")?;
        let high = column::<Float64Array>(t, batch, "high")?;
        let low = column::<Float64Array>(t, batch, "low")?;
        let close = column::<Float64Array>(t, batch, "close")?;
        let settle_price = column::<Float64Array>(t, batch, "settle_price")?;
        let contracts = column::<Int64Array>(t, batch, "contracts")?;
        let value_lakhs = column::<Float64Array>(t, batch, "value_lakhs")?;
        let oi = column::<Int64Array>(t, batch, "open_interest_contracts")?;
        let lot = column::<Int64Array>(t, batch, "lot_size_shares")?;
        let change = column::<Int64Array>(t, batch, "change_in_oi_contracts")?;
        let mut rows = Vec::with_capacity(batch.num_rows());
        for idx in 0..batch.num_rows() {
            rows.push(FoBhavcopyRow {
                trade_date: date_at(t, trade_date, idx)?,
                instrument: instrument.value(idx).to_string(),
                symbol: symbol.value(idx).to_string(),
                expiry_date: date_at(t, expiry_date, idx)?,
                open: open.value(idx),
                high: high.value(idx),
                low: low.value(idx),
                close: close.value(idx),
                settle_price: settle_price.value(idx),
                contracts: contracts.value(idx),
                value_lakhs: value_lakhs.value(idx),
                open_interest_contracts: oi.value(idx),
                lot_size_shares: lot.value(idx),
                change_in_oi_contracts: opt_i64_at(change, idx),
            });
        }
        Ok(rows)
    }

    fn cmp_rows(a: &Self, b: &Self) -> Ordering {
        a.symbol
            .cmp(&b.symbol)
            .then(a.expiry_date.cmp(&b.expiry_date))
            .then(a.instrument.cmp(&b.instrument))
            .then(a.trade_date.cmp(&b.trade_date))
            .then(a.open_interest_contracts.cmp(&b.open_interest_contracts))
            .then(a.contracts.cmp(&b.contracts))
            .then(a.lot_size_shares.cmp(&b.lot_size_shares))
            .then(a.change_in_oi_contracts.cmp(&b.change_in_oi_contracts))
            .then(a.close.total_cmp(&b.close))
            .then(a.settle_price.total_cmp(&b.settle_price))
            .then(a.value_lakhs.total_cmp(&b.value_lakhs))
            .then(a.open.total_cmp(&b.open))
            .then(a.high.total_cmp(&b.high))
            .then(a.low.total_cmp(&b.low))
    }
}

impl PartitionRecord for MwplRow {
    const TABLE: Table = Table::MwplCombinedDay;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, StoreError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.trade_date)),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.symbol.as_str()))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.mwpl_shares))),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.combined_oi_shares),
            )),
        ];
        batch(Self::TABLE, arrays)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError> {
        let t = Self::TABLE;
        let trade_date = column::<Date32Array>(t, batch, "trade_date")?;
        let symbol = column::<StringArray>(t, batch, "symbol")?;
        let mwpl = column::<Int64Array>(t, batch, "mwpl_shares")?;
        let combined = column::<Int64Array>(t, batch, "combined_oi_shares")?;
        let mut rows = Vec::with_capacity(batch.num_rows());
        for idx in 0..batch.num_rows() {
            rows.push(MwplRow {
                trade_date: date_at(t, trade_date, idx)?,
                symbol: symbol.value(idx).to_string(),
                mwpl_shares: mwpl.value(idx),
                combined_oi_shares: combined.value(idx),
            });
        }
        Ok(rows)
    }

    fn cmp_rows(a: &Self, b: &Self) -> Ordering {
        a.symbol
            .cmp(&b.symbol)
            .then(a.trade_date.cmp(&b.trade_date))
            .then(a.mwpl_shares.cmp(&b.mwpl_shares))
            .then(a.combined_oi_shares.cmp(&b.combined_oi_shares))
    }
}

impl PartitionRecord for GoldRow {
    const TABLE: Table = Table::FuturesDay;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, StoreError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.symbol.as_str()))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.trade_date)),
            )),
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.contract_count))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.near_expiry)),
            )),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.near_close))),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.near_settle_price),
            )),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.total_contracts_traded),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.total_value_lakhs),
            )),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.total_oi_contracts),
            )),
            Arc::new(Int64Array::from(
                rows.iter()
                    .map(|r| r.total_change_in_oi_contracts)
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.lot_size_shares))),
            Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.lot_size_mismatch).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_oi_shares))),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.mwpl_shares).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.combined_oi_shares).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter()
                    .map(|r| r.mwpl_utilisation_pct)
                    .collect::<Vec<_>>(),
            )),
            Arc::new(BooleanArray::from(
                rows.iter().map(|r| r.mwpl_missing).collect::<Vec<_>>(),
            )),
        ];
        batch(Self::TABLE, arrays)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError> {
        let t = Self::TABLE;
        let symbol = column::<StringArray>(t, batch, "symbol")?;
        let trade_date = column::<Date32Array>(t, batch, "trade_date")?;
        let contract_count = column::<UInt32Array>(t, batch, "contract_count")?;
        let near_expiry = column::<Date32Array>(t, batch, "near_expiry")?;
        let near_close = column::<Float64Array>(t, batch, "near_close")?;
        let near_settle = column::<Float64Array>(t, batch, "near_settle_price")?;
        let traded = column::<Int64Array>(t, batch, "total_contracts_traded")?;
        let value = column::<Float64Array>(t, batch, "total_value_lakhs")?;
        let oi = column::<Int64Array>(t, batch, "total_oi_contracts")?;
        let change = column::<Int64Array>(t, batch, "total_change_in_oi_contracts")?;
        let lot = column::<Int64Array>(t, batch, "lot_size_shares")?;
        let mismatch = column::<BooleanArray>(t, batch, "lot_size_mismatch")?;
        let oi_shares = column::<Int64Array>(t, batch, "total_oi_shares")?;
        let mwpl = column::<Int64Array>(t, batch, "mwpl_shares")?;
        let combined = column::<Int64Array>(t, batch, "combined_oi_shares")?;
        let utilisation = column::<Float64Array>(t, batch, "mwpl_utilisation_pct")?;
        let missing = column::<BooleanArray>(t, batch, "mwpl_missing")?;
        let mut rows = Vec::with_capacity(batch.num_rows());
        for idx in 0..batch.num_rows() {
            rows.push(GoldRow {
                symbol: symbol.value(idx).to_string(),
                trade_date: date_at(t, trade_date, idx)?,
                contract_count: contract_count.value(idx),
                near_expiry: date_at(t, near_expiry, idx)?,
                near_close: near_close.value(idx),
                near_settle_price: near_settle.value(idx),
                total_contracts_traded: traded.value(idx),
                total_value_lakhs: value.value(idx),
                total_oi_contracts: oi.value(idx),
                total_change_in_oi_contracts: opt_i64_at(change, idx),
                lot_size_shares: lot.value(idx),
                lot_size_mismatch: mismatch.value(idx),
                total_oi_shares: oi_shares.value(idx),
                mwpl_shares: opt_i64_at(mwpl, idx),
                combined_oi_shares: opt_i64_at(combined, idx),
                mwpl_utilisation_pct: opt_f64_at(utilisation, idx),
                mwpl_missing: missing.value(idx),
            });
        }
        Ok(rows)
    }

    fn cmp_rows(a: &Self, b: &Self) -> Ordering {
        a.symbol
            .cmp(&b.symbol)
            .then(a.trade_date.cmp(&b.trade_date))
    }
}

impl PartitionRecord for SummaryRow {
    const TABLE: Table = Table::FuturesSummary;

    fn to_batch(rows: &[Self]) -> Result<RecordBatch, StoreError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.symbol.as_str()))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.expiry_date)),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.anchor.as_str()))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.anchor_source.as_str()),
            )),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.cycle_start)),
            )),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.as_of_date)),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.state.as_str()))),
            Arc::new(UInt32Array::from_iter_values(rows.iter().map(|r| r.trading_days))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.first_trade_date)),
            )),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.total_contracts_traded),
            )),
            Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.total_value_lakhs),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.open_oi_contracts))),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.close_oi_contracts),
            )),
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.oi_change_contracts),
            )),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.max_oi_contracts))),
            Arc::new(Date32Array::from_iter_values(
                rows.iter().map(|r| date_to_days(r.max_oi_date)),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.mwpl_shares_used).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.lot_size_used).collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter()
                    .map(|r| r.max_permitted_contracts)
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Int64Array::from(
                rows.iter().map(|r| r.threshold_90pct).collect::<Vec<_>>(),
            )),
            Arc::new(Date32Array::from(
                rows.iter()
                    .map(|r| r.mwpl_asof_date.map(date_to_days))
                    .collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter()
                    .map(|r| r.peak_oi_utilisation_pct)
                    .collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from(
                rows.iter()
                    .map(|r| r.days_above_threshold)
                    .collect::<Vec<_>>(),
            )),
            Arc::new(UInt32Array::from_iter_values(
                rows.iter().map(|r| r.mwpl_carried_days),
            )),
        ];
        batch(Self::TABLE, arrays)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError> {
        let t = Self::TABLE;
        let symbol = column::<StringArray>(t, batch, "symbol")?;
        let expiry_date = column::<Date32Array>(t, batch, "expiry_date")?;
        let anchor = column::<StringArray>(t, batch, "anchor")?;
        let anchor_source = column::<StringArray>(t, batch, "anchor_source")?;
        let cycle_start = column::<Date32Array>(t, batch, "cycle_start")?;
        let as_of_date = column::<Date32Array>(t, batch, "as_of_date")?;
        let state = column::<StringArray>(t, batch, "state")?;
        let trading_days = column::<UInt32Array>(t, batch, "trading_days")?;
        let first_trade_date = column::<Date32Array>(t, batch, "first_trade_date")?;
        let traded = column::<Int64Array>(t, batch, "total_contracts_traded")?;
        let value = column::<Float64Array>(t, batch, "total_value_lakhs")?;
        let open_oi = column::<Int64Array>(t, batch, "open_oi_contracts")?;
        let close_oi = column::<Int64Array>(t, batch, "close_oi_contracts")?;
        let oi_change = column::<Int64Array>(t, batch, "oi_change_contracts")?;
        let max_oi = column::<Int64Array>(t, batch, "max_oi_contracts")?;
        let max_oi_date = column::<Date32Array>(t, batch, "max_oi_date")?;
        let mwpl_used = column::<Int64Array>(t, batch, "mwpl_shares_used")?;
        let lot_used = column::<Int64Array>(t, batch, "lot_size_used")?;
        let max_permitted = column::<Int64Array>(t, batch, "max_permitted_contracts")?;
        let threshold = column::<Int64Array>(t, batch, "threshold_90pct")?;
        let mwpl_asof = column::<Date32Array>(t, batch, "mwpl_asof_date")?;
        let peak = column::<Float64Array>(t, batch, "peak_oi_utilisation_pct")?;
        let above = column::<UInt32Array>(t, batch, "days_above_threshold")?;
        let carried = column::<UInt32Array>(t, batch, "mwpl_carried_days")?;
        let mut rows = Vec::with_capacity(batch.num_rows());
        for idx in 0..batch.num_rows() {
            rows.push(SummaryRow {
                symbol: symbol.value(idx).to_string(),
                expiry_date: date_at(t, expiry_date, idx)?,
                anchor: parse_at(t, anchor, idx)?,
                anchor_source: parse_at(t, anchor_source, idx)?,
                cycle_start: date_at(t, cycle_start, idx)?,
                as_of_date: date_at(t, as_of_date, idx)?,
                state: parse_at(t, state, idx)?,
                trading_days: trading_days.value(idx),
                first_trade_date: date_at(t, first_trade_date, idx)?,
                total_contracts_traded: traded.value(idx),
                total_value_lakhs: value.value(idx),
                open_oi_contracts: open_oi.value(idx),
                close_oi_contracts: close_oi.value(idx),
                oi_change_contracts: oi_change.value(idx),
                max_oi_contracts: max_oi.value(idx),
                max_oi_date: date_at(t, max_oi_date, idx)?,
                mwpl_shares_used: opt_i64_at(mwpl_used, idx),
                lot_size_used: opt_i64_at(lot_used, idx),
                max_permitted_contracts: opt_i64_at(max_permitted, idx),
                threshold_90pct: opt_i64_at(threshold, idx),
                mwpl_asof_date: opt_date_at(t, mwpl_asof, idx)?,
                peak_oi_utilisation_pct: opt_f64_at(peak, idx),
                days_above_threshold: opt_u32_at(above, idx),
                mwpl_carried_days: carried.value(idx),
            });
        }
        Ok(rows)
    }

    fn cmp_rows(a: &Self, b: &Self) -> Ordering {
        a.symbol
            .cmp(&b.symbol)
            .then(a.expiry_date.cmp(&b.expiry_date))
            .then(a.anchor.cmp(&b.anchor))
    }
}
