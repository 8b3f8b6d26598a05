// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Fintrack", "fintrack"));

pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Runtime configuration, resolved once at startup and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_level: String,
    /// How long a writer waits for the ledger lock before failing with
    /// `LedgerError::Busy`.
    pub busy_timeout: Duration,
}

impl Config {
    /// Builds the configuration from the top-level CLI matches. Flags fall
    /// back to `FINTRACK_*` environment variables through clap.
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let db_path = match m.get_one::<String>("db").map(|s| s.trim()) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => default_db_path()?,
        };
        let log_level = m
            .get_one::<String>("log_level")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let busy_ms = m
            .get_one::<u64>("busy_timeout_ms")
            .copied()
            .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS);
        Ok(Self {
            db_path,
            log_level,
            busy_timeout: Duration::from_millis(busy_ms),
        })
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("fintrack.sqlite"))
}

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_logging(cfg: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("fintrack={}", cfg.log_level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
