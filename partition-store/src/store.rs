// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use core_types::{PartitionKey, Table};
use crc32fast::Hasher as Crc32;
use log::{debug, warn};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::Compression,
    file::properties::WriterProperties,
};
use serde::{Deserialize, Serialize};

use crate::{codec::PartitionRecord, error::StoreError, layout};

/// Outcome of a committed partition write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub table: Table,
    pub key: PartitionKey,
    pub rows: usize,
    /// CRC32 of the committed file bytes.
    pub checksum: u32,
}

/// Parquet partitions under a single root directory.
#[derive(Debug, Clone)]
pub struct PartitionStore {
    root: PathBuf,
}

impl PartitionStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replaces every row at `key`. Readers see either the prior partition or
    /// the new one, never a mix.
    pub fn write<R: PartitionRecord>(
        &self,
        table: Table,
        key: &PartitionKey,
        rows: &[R],
    ) -> Result<PartitionInfo, StoreError> {
        check_record::<R>(table)?;
        check_key(table, key)?;

        let mut ordered = rows.to_vec();
        ordered.sort_by(R::cmp_rows);
        let bytes = encode(&ordered)?;
        let mut hasher = Crc32::new();
        hasher.update(&bytes);
        let checksum = hasher.finalize();

        let dir = layout::partition_dir(&self.root, table, key.date);
        fs::create_dir_all(&dir)?;
        let target_name = layout::file_name(key.symbol.as_deref());
        let target = dir.join(&target_name);
        let temp = TempFile::new(dir.join(layout::temp_file_name(&target_name)));
        {
            let mut file = File::create(temp.path())?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        temp.persist(&target)?;
        sync_dir(&dir);
        debug!(
            "wrote {} {} ({} rows, crc32 {:08x})",
            table,
            key,
            ordered.len(),
            checksum
        );
        Ok(PartitionInfo {
            table,
            key: key.clone(),
            rows: ordered.len(),
            checksum,
        })
    }

    /// Rows at `key`, or `None` when the partition has not been written.
    pub fn read<R: PartitionRecord>(
        &self,
        table: Table,
        key: &PartitionKey,
    ) -> Result<Option<Vec<R>>, StoreError> {
        check_record::<R>(table)?;
        check_key(table, key)?;
        let file = match File::open(self.partition_path(table, key)) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let mut rows = Vec::new();
        for batch in reader {
            rows.extend(R::from_batch(&batch?)?);
        }
        Ok(Some(rows))
    }

    pub fn exists(&self, table: Table, key: &PartitionKey) -> Result<bool, StoreError> {
        check_key(table, key)?;
        Ok(self.partition_path(table, key).is_file())
    }

    /// Committed keys of `table` ordered by date then symbol. Passing a symbol
    /// restricts the listing to that symbol's partitions.
    pub fn list_keys(
        &self,
        table: Table,
        symbol: Option<&str>,
    ) -> Result<Vec<PartitionKey>, StoreError> {
        if symbol.is_some() && !table.is_symbolled() {
            return Err(StoreError::schema(table, "table is not partitioned by symbol"));
        }
        let mut keys = Vec::new();
        for (date, dir) in self.date_dirs(table)? {
            if !table.is_symbolled() {
                if dir.join(layout::file_name(None)).is_file() {
                    keys.push(PartitionKey::day(date));
                }
                continue;
            }
            if let Some(symbol) = symbol {
                if dir.join(layout::file_name(Some(symbol))).is_file() {
                    keys.push(PartitionKey::symbol(symbol, date));
                }
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let name = entry.file_name();
                if let Some(symbol) = name.to_str().and_then(layout::symbol_from_file) {
                    keys.push(PartitionKey::symbol(symbol, date));
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Removes temp files left behind by interrupted writes. Returns how many were removed.
    pub fn cleanup_temp_files(&self, table: Table) -> Result<usize, StoreError> {
        let mut removed = 0;
        for (_, dir) in self.date_dirs(table)? {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name();
                if name.to_str().is_some_and(layout::is_temp_file) {
                    fs::remove_file(entry.path())?;
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            warn!("removed {} stale temp files from {}", removed, table);
        }
        Ok(removed)
    }

    fn partition_path(&self, table: Table, key: &PartitionKey) -> PathBuf {
        layout::partition_dir(&self.root, table, key.date)
            .join(layout::file_name(key.symbol.as_deref()))
    }

    fn date_dirs(&self, table: Table) -> Result<Vec<(chrono::NaiveDate, PathBuf)>, StoreError> {
        let table_dir = layout::table_dir(&self.root, table);
        let entries = match fs::read_dir(&table_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(date) = entry.file_name().to_str().and_then(layout::parse_date_dir) {
                dirs.push((date, entry.path()));
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

fn check_record<R: PartitionRecord>(table: Table) -> Result<(), StoreError> {
    if R::TABLE != table {
        return Err(StoreError::schema(
            table,
            format!("rows belong to {}", R::TABLE),
        ));
    }
    Ok(())
}

fn check_key(table: Table, key: &PartitionKey) -> Result<(), StoreError> {
    match (&key.symbol, table.is_symbolled()) {
        (Some(symbol), true) if symbol.is_empty() => {
            Err(StoreError::schema(table, "empty symbol in key"))
        }
        (Some(_), true) | (None, false) => Ok(()),
        (None, true) => Err(StoreError::schema(table, "key requires a symbol")),
        (Some(_), false) => Err(StoreError::schema(table, "key must not carry a symbol")),
    }
}

fn encode<R: PartitionRecord>(rows: &[R]) -> Result<Vec<u8>, StoreError> {
    let batch = R::to_batch(rows)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(Vec::new(), batch.schema(), Some(props))?;
    writer.write(&batch)?;
    Ok(writer.into_inner()?)
}

/// Best effort: makes the rename durable on filesystems that need a directory fsync.
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

/// Temp file removed on drop unless persisted.
struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persist(mut self, target: &Path) -> io::Result<()> {
        fs::rename(&self.path, target)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{FoBhavcopyRow, GoldRow, MwplRow};
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn gold(symbol: &str, date: NaiveDate, oi: i64) -> GoldRow {
        GoldRow {
            symbol: symbol.to_string(),
            trade_date: date,
            contract_count: 3,
            near_expiry: day(26),
            near_close: 101.5,
            near_settle_price: 101.25,
            total_contracts_traded: 1200,
            total_value_lakhs: 5432.1,
            total_oi_contracts: oi,
            total_change_in_oi_contracts: Some(-40),
            lot_size_shares: 50,
            lot_size_mismatch: false,
            total_oi_shares: oi * 50,
            mwpl_shares: None,
            combined_oi_shares: None,
            mwpl_utilisation_pct: None,
            mwpl_missing: true,
        }
    }

    fn fut(symbol: &str, expiry: NaiveDate, oi: i64) -> FoBhavcopyRow {
        FoBhavcopyRow {
            trade_date: day(3),
            instrument: "FUTSTK".to_string(),
            symbol: symbol.to_string(),
            expiry_date: expiry,
            open: 10.0,
            high: 11.0,
            low: 9.5,
            close: 10.5,
            settle_price: 10.4,
            contracts: 12,
            value_lakhs: 3.2,
            open_interest_contracts: oi,
            lot_size_shares: 100,
            change_in_oi_contracts: None,
        }
    }

    #[test]
    fn missing_partition_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let key = PartitionKey::symbol("NIFTY", day(3));
        let rows: Option<Vec<GoldRow>> = store.read(Table::FuturesDay, &key).unwrap();
        assert!(rows.is_none());
        assert!(!store.exists(Table::FuturesDay, &key).unwrap());
        assert!(store.list_keys(Table::FuturesDay, None).unwrap().is_empty());
    }

    #[test]
    fn write_replaces_rather_than_appends() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let key = PartitionKey::symbol("NIFTY", day(3));

        store
            .write(Table::FuturesDay, &key, &[gold("NIFTY", day(3), 100)])
            .unwrap();
        store
            .write(Table::FuturesDay, &key, &[gold("NIFTY", day(3), 250)])
            .unwrap();

        let rows: Vec<GoldRow> = store.read(Table::FuturesDay, &key).unwrap().unwrap();
        assert_eq!(rows, vec![gold("NIFTY", day(3), 250)]);
    }

    #[test]
    fn identical_rows_produce_identical_bytes() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let key = PartitionKey::day(day(3));
        let a = fut("ACC", day(26), 5);
        let b = fut("ACC", NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(), 7);

        let first = store
            .write(Table::FoBhavcopyDay, &key, &[a.clone(), b.clone()])
            .unwrap();
        let path = layout::partition_dir(dir.path(), Table::FoBhavcopyDay, day(3))
            .join("data.parquet");
        let first_bytes = fs::read(&path).unwrap();
        let second = store.write(Table::FoBhavcopyDay, &key, &[b, a]).unwrap();
        let second_bytes = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_bytes, second_bytes);
    }

    #[test]
    fn list_keys_orders_by_date_and_filters_symbol() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        for (symbol, d) in [("NIFTY", 10), ("M&M", 4), ("NIFTY", 4), ("M&M", 11)] {
            store
                .write(
                    Table::FuturesDay,
                    &PartitionKey::symbol(symbol, day(d)),
                    &[gold(symbol, day(d), 1)],
                )
                .unwrap();
        }

        let all = store.list_keys(Table::FuturesDay, None).unwrap();
        assert_eq!(
            all,
            vec![
                PartitionKey::symbol("M&M", day(4)),
                PartitionKey::symbol("NIFTY", day(4)),
                PartitionKey::symbol("NIFTY", day(10)),
                PartitionKey::symbol("M&M", day(11)),
            ]
        );
        let nifty = store.list_keys(Table::FuturesDay, Some("NIFTY")).unwrap();
        assert_eq!(
            nifty.iter().map(|k| k.date).collect::<Vec<_>>(),
            vec![day(4), day(10)]
        );
    }

    #[test]
    fn stray_temp_files_are_invisible_and_cleanable() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let key = PartitionKey::day(day(5));
        let rows = vec![MwplRow {
            trade_date: day(5),
            symbol: "ACC".to_string(),
            mwpl_shares: 1_000_000,
            combined_oi_shares: 400_000,
        }];
        store.write(Table::MwplCombinedDay, &key, &rows).unwrap();

        let partition = layout::partition_dir(dir.path(), Table::MwplCombinedDay, day(5));
        fs::write(partition.join(".data.parquet.99-0.tmp"), b"partial").unwrap();
        let stray_day = layout::partition_dir(dir.path(), Table::MwplCombinedDay, day(6));
        fs::create_dir_all(&stray_day).unwrap();
        fs::write(stray_day.join(".data.parquet.99-1.tmp"), b"partial").unwrap();

        assert_eq!(
            store.list_keys(Table::MwplCombinedDay, None).unwrap(),
            vec![key.clone()]
        );
        assert!(!store
            .exists(Table::MwplCombinedDay, &PartitionKey::day(day(6)))
            .unwrap());
        assert_eq!(store.cleanup_temp_files(Table::MwplCombinedDay).unwrap(), 2);
        let read: Vec<MwplRow> = store.read(Table::MwplCombinedDay, &key).unwrap().unwrap();
        assert_eq!(read, rows);
    }

    #[test]
    fn rejects_mismatched_table_and_key_shape() {
        let dir = tempdir().unwrap();
        let store = PartitionStore::open(dir.path()).unwrap();
        let rows = [gold("NIFTY", day(3), 1)];

        let wrong_table = store.write(
            Table::FuturesSummary,
            &PartitionKey::symbol("NIFTY", day(3)),
            &rows,
        );
        assert!(matches!(wrong_table, Err(StoreError::Schema { .. })));

        let no_symbol = store.write(Table::FuturesDay, &PartitionKey::day(day(3)), &rows);
        assert!(matches!(no_symbol, Err(StoreError::Schema { .. })));

        let symbol_on_silver = store.list_keys(Table::FoBhavcopyDay, Some("NIFTY"));
        assert!(matches!(symbol_on_silver, Err(StoreError::Schema { .. })));
    }
}
