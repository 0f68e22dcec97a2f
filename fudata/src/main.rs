// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{path::PathBuf, process};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config::ConfigError;
use core_types::{config::AppConfig, ParseMonthError, Table, YearMonth};
use fudata::{manifest, Pipeline, PipelineError, PipelineOptions};
use log::{info, warn};
use partition_store::{PartitionStore, StoreError};
use thiserror::Error;

/// Futures bhavcopy and MWPL analytics: gold daily rows and W1/W3 expiry summaries.
#[derive(Parser, Debug)]
#[command(name = "fudata", version)]
struct Cli {
    /// Configuration file (defaults to ./fudata.toml when present)
    #[arg(long, global = true, env = "FUDATA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild gold rows and impacted summaries for an inclusive date range
    Run {
        start: NaiveDate,
        end: NaiveDate,
        /// Comma separated symbols; falls back to the configured list, then to every symbol in silver
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Recompute summaries already closed at their expiry
        #[arg(long)]
        rebuild_closed: bool,
    },
    /// Print the resolved W1/W3 window for a symbol and month (YYYY-MM)
    Windows { symbol: String, month: String },
    /// Remove temp files left behind by interrupted writes
    Cleanup,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("fudata failed: {err}");
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command completed but some units failed.
fn run() -> Result<bool, AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let store = PartitionStore::open(&config.storage.root)?;
    let mut options = PipelineOptions::from_config(&config)?;

    match cli.command {
        Command::Run {
            start,
            end,
            symbols,
            rebuild_closed,
        } => {
            options.summary.rebuild_closed |= rebuild_closed;
            let symbols = if symbols.is_empty() {
                config.symbols.clone()
            } else {
                symbols
            };
            let pipeline = Pipeline::new(store, options);
            let report = pipeline.run(&symbols, start, end)?;
            let path = manifest::write_manifest(pipeline.store().root(), &report)?;
            info!("run manifest written to {}", path.display());
            for failure in &report.failures {
                eprintln!("{:?} {}: {}", failure.kind, failure.unit, failure.message);
            }
            Ok(report.is_success())
        }
        Command::Windows { symbol, month } => {
            let month: YearMonth = month.parse()?;
            let pipeline = Pipeline::new(store, options);
            let resolution = pipeline.resolve_window(&symbol, month)?;
            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(true)
        }
        Command::Cleanup => {
            let mut removed = 0;
            for table in Table::ALL {
                removed += store.cleanup_temp_files(table)?;
            }
            if removed == 0 {
                info!("no temp files under {}", store.root().display());
            } else {
                warn!("removed {} temp files under {}", removed, store.root().display());
            }
            Ok(true)
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Month(#[from] ParseMonthError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
