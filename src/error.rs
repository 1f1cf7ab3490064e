// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Every failure a pipeline stage can report.
///
/// Each variant is fatal to the current run. Variants carry the file, key,
/// column or backend involved so the caller can act on them without parsing
/// the message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load dataset {path}: {reason}")]
    DataLoad { path: PathBuf, reason: String },

    #[error("cannot encode value {value:?} in column {column} (row {row})")]
    Encoding {
        column: String,
        row: usize,
        value: String,
    },

    #[error("feature schema mismatch on column {column}: {reason}")]
    SchemaMismatch { column: String, reason: String },

    #[error("model registry ({backend}) unavailable: {reason}")]
    StorageUnavailable {
        backend: &'static str,
        reason: String,
    },

    #[error("failed to load model from {location}: {reason}")]
    ModelLoad { location: String, reason: String },

    #[error("incumbent model {key} is present but unusable: {source}")]
    IncumbentUnavailable {
        key: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("inference failed: expected {expected} values, got {found}")]
    Inference { expected: usize, found: usize },

    #[error("training failed: {0}")]
    Training(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to write artifact {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn storage(backend: &'static str, reason: impl ToString) -> Self {
        PipelineError::StorageUnavailable {
            backend,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PipelineError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn schema(column: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::SchemaMismatch {
            column: column.into(),
            reason: reason.to_string(),
        }
    }
}
