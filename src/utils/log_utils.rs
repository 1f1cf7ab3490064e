// src/utils/log_utils.rs
use crate::utils::utils::run_timestamp;
use anyhow::{Context, Result};
use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber: stdout plus a per-run file under `log_dir`.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging(log_dir: &Path) -> Result<PathBuf> {
    if !log_dir.exists() {
        create_dir_all(log_dir).with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    }

    let log_file = log_dir.join(format!("{}.log", run_timestamp()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(log_file)
}
