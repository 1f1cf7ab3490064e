// src/pipeline/training_pipeline.rs
use crate::config::Settings;
use crate::encoding::FeatureEncoder;
use crate::error::{PipelineError, Result};
use crate::pipeline::artifacts::{
    DataValidationArtifact, ModelEvaluationArtifact, ModelPusherArtifact, ModelTrainerArtifact,
};
use crate::pipeline::evaluation::{EvaluationConfig, ModelEvaluator};
use crate::pipeline::pusher::ModelPusher;
use crate::pipeline::trainer::ModelTrainer;
use crate::pipeline::validation::DataValidation;
use crate::registry::{ModelHandle, ObjectStore};
use crate::utils::utils::{measure_time, run_timestamp};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything one run produced, in stage order.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_dir: PathBuf,
    pub validation: DataValidationArtifact,
    pub trainer: ModelTrainerArtifact,
    pub evaluation: ModelEvaluationArtifact,
    pub pusher: Option<ModelPusherArtifact>,
}

/// Runs validation, training, evaluation and promotion in sequence against
/// one registry. Each run writes under its own timestamped directory.
pub struct TrainingPipeline {
    settings: Settings,
    store: Arc<dyn ObjectStore>,
    encoder: FeatureEncoder,
    run_dir: PathBuf,
}

impl TrainingPipeline {
    pub fn new(settings: Settings, store: Arc<dyn ObjectStore>) -> Self {
        let run_dir = settings.artifact_dir.join(run_timestamp());
        Self::with_run_dir(settings, store, run_dir)
    }

    pub fn with_run_dir(settings: Settings, store: Arc<dyn ObjectStore>, run_dir: PathBuf) -> Self {
        let encoder = FeatureEncoder::new(settings.encoding.clone());
        Self {
            settings,
            store,
            encoder,
            run_dir,
        }
    }

    /// Handle on the production slot of the registry.
    pub fn production_model(&self) -> ModelHandle {
        ModelHandle::registry(self.store.clone(), self.settings.registry.model_key.clone())
    }

    fn trained_model_file_path(&self) -> PathBuf {
        self.settings.model_path_in(&self.run_dir)
    }

    /// Validate both datasets. A failed validation is a `DataLoad` error.
    pub fn start_data_validation(&self) -> Result<DataValidationArtifact> {
        let report = self.run_dir.join("data_validation").join("report.json");
        let artifact = DataValidation::new(&self.settings.data, &self.settings.encoding.id_column, report)
            .initiate_data_validation()?;

        if !artifact.validation_status {
            return Err(PipelineError::data_load(
                &self.settings.data.train_file_path,
                format!("dataset validation failed\n{}", artifact.message),
            ));
        }
        Ok(artifact)
    }

    pub fn start_model_trainer(&self) -> Result<ModelTrainerArtifact> {
        ModelTrainer::new(
            &self.settings.data,
            &self.settings.training,
            &self.encoder,
            self.trained_model_file_path(),
        )
        .initiate_model_trainer()
    }

    pub async fn start_model_evaluation(&self, trainer: &ModelTrainerArtifact) -> Result<ModelEvaluationArtifact> {
        let config = EvaluationConfig {
            test_file_path: self.settings.data.test_file_path.clone(),
            target_column: self.settings.data.target_column.clone(),
            remote_model_path: self.settings.registry.model_key.clone(),
            decision_file_path: self.run_dir.join("model_evaluation").join("report.json"),
        };
        let incumbent = self.production_model();

        ModelEvaluator::new(config, &self.encoder, trainer, &incumbent)
            .initiate_model_evaluation()
            .await
    }

    pub async fn start_model_pusher(&self, evaluation: &ModelEvaluationArtifact) -> Result<Option<ModelPusherArtifact>> {
        let mut production = self.production_model();
        ModelPusher::new(&mut production, false)
            .initiate_model_pusher(evaluation)
            .await
    }

    pub async fn run_pipeline(&self) -> anyhow::Result<PipelineOutcome> {
        info!("Starting training pipeline in {}", self.run_dir.display());

        let validation = measure_time("Data validation", async { self.start_data_validation() })
            .await
            .context("Data validation stage failed")?;

        let trainer = measure_time("Model training", async { self.start_model_trainer() })
            .await
            .context("Model training stage failed")?;

        let evaluation = measure_time("Model evaluation", self.start_model_evaluation(&trainer))
            .await
            .context("Model evaluation stage failed")?;

        let pusher = measure_time("Model push", self.start_model_pusher(&evaluation))
            .await
            .context("Model push stage failed")?;

        info!("Training pipeline finished, accepted: {}", evaluation.is_accepted);

        Ok(PipelineOutcome {
            run_dir: self.run_dir.clone(),
            validation,
            trainer,
            evaluation,
            pusher,
        })
    }
}
