use crate::error::{PipelineError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::info;

// Utility function to measure execution time of a pipeline stage
pub async fn measure_time<F, T, E>(operation_name: &str, f: F) -> std::result::Result<T, E>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    let start = Instant::now();
    let result = f.await;
    let elapsed = start.elapsed();

    info!(
        "{} {} in {:.2?}",
        operation_name,
        if result.is_ok() { "completed" } else { "failed" },
        elapsed
    );

    result
}

// Format a timestamp for run directories and log files
pub fn format_time(time: &DateTime<Local>) -> String {
    time.format("%m_%d_%Y_%H_%M_%S").to_string()
}

// Current timestamp as used for a run directory name
pub fn run_timestamp() -> String {
    format_time(&Local::now())
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let write_err = |source: io::Error| PipelineError::ArtifactWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    fs::write(path, json).map_err(write_err)
}
