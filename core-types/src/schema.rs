// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Arrow schemas for every stored table.

use std::sync::Arc;

use arrow::datatypes::{DataType, Date32Type, Field, Schema, SchemaRef};
use chrono::NaiveDate;

use crate::tables::Table;

/// Converts a date to an Arrow `Date32` value.
pub fn date_to_days(date: NaiveDate) -> i32 {
    Date32Type::from_naive_date(date)
}

pub fn fo_bhavcopy_schema() -> Schema {
    Schema::new(vec![
        Field::new("trade_date", DataType::Date32, false),
        Field::new("instrument", DataType::Utf8, false),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("expiry_date", DataType::Date32, false),
        Field::new("open", DataType::Float64, false),
        Field::new("high", DataType::Float64, false),
        Field::new("low", DataType::Float64, false),
        Field::new("close", DataType::Float64, false),
        Field::new("settle_price", DataType::Float64, false),
        Field::new("contracts", DataType::Int64, false),
        Field::new("value_lakhs", DataType::Float64, false),
        Field::new("open_interest_contracts", DataType::Int64, false),
        Field::new("lot_size_shares", DataType::Int64, false),
        Field::new("change_in_oi_contracts", DataType::Int64, true),
    ])
}

pub fn mwpl_schema() -> Schema {
    Schema::new(vec![
        Field::new("trade_date", DataType::Date32, false),
        Field::new("symbol", DataType::Utf8, false),
        Field::new("mwpl_shares", DataType::Int64, false),
        Field::new("combined_oi_shares", DataType::Int64, false),
    ])
}

pub fn futures_day_schema() -> Schema {
    Schema::new(vec![
        Field::new("symbol", DataType::Utf8, false),
        Field::new("trade_date", DataType::Date32, false),
        Field::new("contract_count", DataType::UInt32, false),
        Field::new("near_expiry", DataType::Date32, false),
        Field::new("near_close", DataType::Float64, false),
        Field::new("near_settle_price", DataType::Float64, false),
        Field::new("total_contracts_traded", DataType::Int64, false),
        Field::new("total_value_lakhs", DataType::Float64, false),
        Field::new("total_oi_contracts", DataType::Int64, false),
        Field::new("total_change_in_oi_contracts", DataType::Int64, true),
        Field::new("lot_size_shares", DataType::Int64, false),
        Field::new("lot_size_mismatch", DataType::Boolean, false),
        Field::new("total_oi_shares", DataType::Int64, false),
        Field::new("mwpl_shares", DataType::Int64, true),
        Field::new("combined_oi_shares", DataType::Int64, true),
        Field::new("mwpl_utilisation_pct", DataType::Float64, true),
        Field::new("mwpl_missing", DataType::Boolean, false),
    ])
}

pub fn futures_summary_schema() -> Schema {
    Schema::new(vec![
        Field::new("symbol", DataType::Utf8, false),
        Field::new("expiry_date", DataType::Date32, false),
        Field::new("anchor", DataType::Utf8, false),
        Field::new("anchor_source", DataType::Utf8, false),
        Field::new("cycle_start", DataType::Date32, false),
        Field::new("as_of_date", DataType::Date32, false),
        Field::new("state", DataType::Utf8, false),
        Field::new("trading_days", DataType::UInt32, false),
        Field::new("first_trade_date", DataType::Date32, false),
        Field::new("total_contracts_traded", DataType::Int64, false),
        Field::new("total_value_lakhs", DataType::Float64, false),
        Field::new("open_oi_contracts", DataType::Int64, false),
        Field::new("close_oi_contracts", DataType::Int64, false),
        Field::new("oi_change_contracts", DataType::Int64, false),
        Field::new("max_oi_contracts", DataType::Int64, false),
        Field::new("max_oi_date", DataType::Date32, false),
        Field::new("mwpl_shares_used", DataType::Int64, true),
        Field::new("lot_size_used", DataType::Int64, true),
        Field::new("max_permitted_contracts", DataType::Int64, true),
        Field::new("threshold_90pct", DataType::Int64, true),
        Field::new("mwpl_asof_date", DataType::Date32, true),
        Field::new("peak_oi_utilisation_pct", DataType::Float64, true),
        Field::new("days_above_threshold", DataType::UInt32, true),
        Field::new("mwpl_carried_days", DataType::UInt32, false),
    ])
}

pub fn schema_for(table: Table) -> SchemaRef {
    Arc::new(match table {
        Table::FoBhavcopyDay => fo_bhavcopy_schema(),
        Table::MwplCombinedDay => mwpl_schema(),
        Table::FuturesDay => futures_day_schema(),
        Table::FuturesSummary => futures_summary_schema(),
    })
}
