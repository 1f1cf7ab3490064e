// src/pipeline/evaluation.rs
use crate::data::loader::LabeledFrame;
use crate::encoding::{EncodedFrame, FeatureEncoder};
use crate::error::{PipelineError, Result};
use crate::model::metrics::f1_score;
use crate::pipeline::artifacts::{ModelEvaluationArtifact, ModelTrainerArtifact};
use crate::registry::ModelHandle;
use crate::utils::utils::write_json;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, instrument};

/// The accept/reject decision for one candidate.
///
/// `accepted` holds exactly when `candidate_score > max(incumbent_score, 0)`
/// and `score_delta` is measured against that same floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub accepted: bool,
    pub score_delta: f64,
    pub candidate_score: f64,
    pub incumbent_score: Option<f64>,
}

impl EvaluationResult {
    /// Compare a candidate against the incumbent, if any. Equal scores reject.
    pub fn decide(candidate_score: f64, incumbent_score: Option<f64>) -> Self {
        let baseline = incumbent_score.map_or(0.0, |s| s.max(0.0));
        Self {
            accepted: candidate_score > baseline,
            score_delta: candidate_score - baseline,
            candidate_score,
            incumbent_score,
        }
    }
}

/// Inputs the gate needs beyond the two models.
#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub test_file_path: PathBuf,
    pub target_column: String,
    /// Registry key the candidate would occupy if promoted.
    pub remote_model_path: String,
    pub decision_file_path: PathBuf,
}

/// Decides whether a freshly trained model replaces the one in production.
pub struct ModelEvaluator<'a> {
    config: EvaluationConfig,
    encoder: &'a FeatureEncoder,
    trainer_artifact: &'a ModelTrainerArtifact,
    incumbent: &'a ModelHandle,
}

impl<'a> ModelEvaluator<'a> {
    pub fn new(
        config: EvaluationConfig,
        encoder: &'a FeatureEncoder,
        trainer_artifact: &'a ModelTrainerArtifact,
        incumbent: &'a ModelHandle,
    ) -> Self {
        Self {
            config,
            encoder,
            trainer_artifact,
            incumbent,
        }
    }

    async fn score(handle: &ModelHandle, encoded: &EncodedFrame, labels: &[u8]) -> Result<f64> {
        let model = handle.load().await?;
        let x = encoded.reconcile(model.expected_columns())?;
        let y_hat = model.predict(&x)?;
        f1_score(labels, &y_hat)
    }

    /// Run the gate once: load, encode, score, resolve the incumbent, decide.
    #[instrument(skip(self), fields(test_file = %self.config.test_file_path.display()))]
    pub async fn evaluate(&self) -> Result<EvaluationResult> {
        let test = LabeledFrame::load(&self.config.test_file_path, &self.config.target_column)?;
        info!("Test data loaded ({} rows), encoding features", test.labels.len());
        let encoded = self.encoder.encode(&test.features)?;

        let mut candidate_score = self.trainer_artifact.metric_artifact.f1_score;
        info!("Trained model reported f1: {}", candidate_score);

        let mut incumbent_score = None;
        if self.incumbent.is_present().await? {
            info!("Production model found at {}, scoring both models on the test set", self.incumbent.location());

            let key = self.incumbent.location().to_string();
            let score = Self::score(self.incumbent, &encoded, &test.labels)
                .await
                .map_err(|e| PipelineError::IncumbentUnavailable {
                    key,
                    source: Box::new(e),
                })?;

            let candidate = ModelHandle::local(&self.trainer_artifact.trained_model_file_path);
            candidate_score = Self::score(&candidate, &encoded, &test.labels).await?;

            info!(
                "F1 production model: {}, F1 new trained model: {}",
                score, candidate_score
            );
            incumbent_score = Some(score);
        } else {
            info!("No production model at {}, comparing against a zero baseline", self.incumbent.location());
        }

        let result = EvaluationResult::decide(candidate_score, incumbent_score);
        info!("Evaluation result: {:?}", result);
        Ok(result)
    }

    /// Evaluate and persist the decision artifact. Nothing is written when
    /// evaluation fails.
    pub async fn initiate_model_evaluation(&self) -> Result<ModelEvaluationArtifact> {
        info!("Model evaluation started");
        let result = self.evaluate().await?;

        let artifact = ModelEvaluationArtifact {
            is_accepted: result.accepted,
            remote_model_path: self.config.remote_model_path.clone(),
            candidate_model_path: self.trainer_artifact.trained_model_file_path.clone(),
            score_delta: result.score_delta,
        };
        write_json(&self.config.decision_file_path, &artifact)?;

        info!("Model evaluation artifact: {:?}", artifact);
        Ok(artifact)
    }
}
