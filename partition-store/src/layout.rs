// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use chrono::NaiveDate;
use core_types::Table;

const DATE_DIR_PREFIX: &str = "date=";
const UNSYMBOLLED_FILE: &str = "data.parquet";
const PARQUET_EXT: &str = ".parquet";
const TEMP_EXT: &str = ".tmp";

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn table_dir(root: &Path, table: Table) -> PathBuf {
    root.join(table.layer().dir_name()).join(table.name())
}

pub fn partition_dir(root: &Path, table: Table, date: NaiveDate) -> PathBuf {
    table_dir(root, table).join(format!("{DATE_DIR_PREFIX}{}", date.format("%Y-%m-%d")))
}

pub fn file_name(symbol: Option<&str>) -> String {
    match symbol {
        Some(symbol) => format!("{}{PARQUET_EXT}", encode_symbol(symbol)),
        None => UNSYMBOLLED_FILE.to_string(),
    }
}

/// Hidden, process-unique sibling for `target` so concurrent writers never share a temp file.
pub fn temp_file_name(target: &str) -> String {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(".{target}.{}-{seq}{TEMP_EXT}", std::process::id())
}

pub fn is_temp_file(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_EXT)
}

pub fn parse_date_dir(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(DATE_DIR_PREFIX)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Symbol carried by a partition file name, `None` for anything that is not a
/// committed symbol partition.
pub fn symbol_from_file(name: &str) -> Option<String> {
    if is_temp_file(name) || name == UNSYMBOLLED_FILE {
        return None;
    }
    decode_symbol(name.strip_suffix(PARQUET_EXT)?)
}

fn is_plain(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'&' | b'-')
}

/// Reversible file-name encoding: plain bytes pass through, the rest become `%XX`.
pub fn encode_symbol(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    for byte in symbol.bytes() {
        if is_plain(byte) {
            out.push(byte as char);
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

pub fn decode_symbol(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'%' => {
                let hex = encoded.get(idx + 1..idx + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                idx += 3;
            }
            byte if is_plain(byte) => {
                out.push(byte);
                idx += 1;
            }
            _ => return None,
        }
    }
    if out.is_empty() {
        return None;
    }
    String::from_utf8(out).ok()
}
