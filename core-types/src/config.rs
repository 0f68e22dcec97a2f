// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{path::Path, path::PathBuf, str::FromStr};

use chrono::{NaiveDate, Weekday};
use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Pipeline configuration: `fudata.toml` overlaid with `FUDATA_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    /// Symbols built when the command line does not name any.
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub expiry: ExpiryConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    /// Weekday contracts expire on when no observation exists ("wed", "thursday", ...).
    #[serde(default = "default_weekday")]
    pub weekday: String,
    /// Days before the run start scanned for observed expiries.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Assumed cycle length when no previous expiry is known.
    #[serde(default = "default_cycle_days")]
    pub cycle_days: u32,
    /// Exchange holidays; a calendar expiry landing on one moves to the prior weekday.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            weekday: default_weekday(),
            lookback_days: default_lookback_days(),
            cycle_days: default_cycle_days(),
            holidays: Vec::new(),
        }
    }
}

fn default_weekday() -> String {
    "wed".to_string()
}

fn default_lookback_days() -> u32 {
    120
}

fn default_cycle_days() -> u32 {
    7
}

impl ExpiryConfig {
    pub fn weekday(&self) -> Result<Weekday, ConfigError> {
        Weekday::from_str(self.weekday.trim()).map_err(|_| {
            ConfigError::Message(format!("expiry.weekday: unknown weekday '{}'", self.weekday))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SummaryConfig {
    /// Rewrite summaries already closed at their expiry.
    #[serde(default)]
    pub rebuild_closed: bool,
}

impl AppConfig {
    /// Loads `path` when given (it must exist), otherwise an optional `fudata.toml`
    /// in the working directory, then applies `FUDATA_*` overrides
    /// (`FUDATA_STORAGE__ROOT`, `FUDATA_SYMBOLS=A,B`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("fudata").required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("FUDATA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("symbols")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.expiry.weekday()?;
        if self.expiry.cycle_days == 0 {
            return Err(ConfigError::Message(
                "expiry.cycle_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_to_missing_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fudata.toml");
        fs::write(&path, "symbols = [\"NIFTY\"]\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.symbols, vec!["NIFTY".to_string()]);
        assert_eq!(config.storage.root, PathBuf::from("./data"));
        assert_eq!(config.expiry.weekday().unwrap(), Weekday::Wed);
        assert_eq!(config.expiry.lookback_days, 120);
        assert_eq!(config.expiry.cycle_days, 7);
        assert!(!config.summary.rebuild_closed);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[storage]
root = "/srv/fudata"

[expiry]
weekday = "thu"
cycle_days = 14
holidays = ["2024-06-26"]

[summary]
rebuild_closed = true
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/srv/fudata"));
        assert_eq!(config.expiry.weekday().unwrap(), Weekday::Thu);
        assert_eq!(config.expiry.cycle_days, 14);
        assert_eq!(
            config.expiry.holidays,
            vec![NaiveDate::from_ymd_opt(2024, 6, 26).unwrap()]
        );
        assert!(config.summary.rebuild_closed);
    }

    #[test]
    fn rejects_unknown_weekday_and_zero_cycle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[expiry]\nweekday = \"someday\"\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());

        fs::write(&path, "[expiry]\ncycle_days = 0\n").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
