// src/pipeline/artifacts.rs
use crate::model::metrics::ClassificationMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of dataset validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub message: String,
    pub report_file_path: PathBuf,
}

/// What the training stage hands to evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_file_path: PathBuf,
    pub metric_artifact: ClassificationMetrics,
}

/// Persisted promotion decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    pub is_accepted: bool,
    pub remote_model_path: String,
    pub candidate_model_path: PathBuf,
    pub score_delta: f64,
}

/// Where an accepted model was promoted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPusherArtifact {
    pub backend: String,
    pub remote_model_path: String,
}
