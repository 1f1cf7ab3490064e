// src/pipeline/trainer.rs
use crate::config::{DataSettings, TrainingSettings};
use crate::data::loader::LabeledFrame;
use crate::encoding::FeatureEncoder;
use crate::error::{PipelineError, Result};
use crate::model::{ClassificationMetrics, LogisticRegression, Preprocessor, TrainedModel};
use crate::pipeline::artifacts::ModelTrainerArtifact;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Fits a candidate model on the train set and scores it on the test set.
pub struct ModelTrainer<'a> {
    data: &'a DataSettings,
    training: &'a TrainingSettings,
    encoder: &'a FeatureEncoder,
    trained_model_file_path: PathBuf,
}

impl<'a> ModelTrainer<'a> {
    pub fn new(
        data: &'a DataSettings,
        training: &'a TrainingSettings,
        encoder: &'a FeatureEncoder,
        trained_model_file_path: PathBuf,
    ) -> Self {
        Self {
            data,
            training,
            encoder,
            trained_model_file_path,
        }
    }

    /// Fit preprocessing and classifier on the encoded train set.
    pub fn train(&self, train: &LabeledFrame) -> Result<TrainedModel> {
        let x = self.encoder.encode(&train.features)?.to_matrix()?;
        info!("Training on {} rows x {} features", x.n_rows(), x.n_features());

        let preprocessor = Preprocessor::fit(&x, &self.training.standard_columns, &self.training.minmax_columns);
        let transformed = preprocessor.transform(&x)?;
        let classifier = LogisticRegression::fit(&transformed, &train.labels, &self.training.classifier)?;

        TrainedModel::new(preprocessor, classifier)
    }

    /// Score `model` on a held-out set encoded the same way as the train set.
    pub fn score(&self, model: &TrainedModel, test: &LabeledFrame) -> Result<ClassificationMetrics> {
        let x = self
            .encoder
            .encode(&test.features)?
            .reconcile(model.expected_columns())?;
        let y_hat = model.predict(&x)?;
        ClassificationMetrics::compute(&test.labels, &y_hat)
    }

    #[instrument(skip(self))]
    pub fn initiate_model_trainer(&self) -> Result<ModelTrainerArtifact> {
        info!("Starting model training");

        let train = LabeledFrame::load(&self.data.train_file_path, &self.data.target_column)?;
        let test = LabeledFrame::load(&self.data.test_file_path, &self.data.target_column)?;

        let model = self.train(&train)?;
        let metrics = self.score(&model, &test)?;
        info!(
            "Trained model f1: {:.4}, precision: {:.4}, recall: {:.4}",
            metrics.f1_score, metrics.precision_score, metrics.recall_score
        );

        if metrics.f1_score < self.training.expected_score {
            return Err(PipelineError::Training(format!(
                "model f1 {:.4} is below the expected score {:.4}",
                metrics.f1_score, self.training.expected_score
            )));
        }

        model.save_to(&self.trained_model_file_path)?;
        info!("Saved trained model to {}", self.trained_model_file_path.display());

        Ok(ModelTrainerArtifact {
            trained_model_file_path: self.trained_model_file_path.clone(),
            metric_artifact: metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// Response follows Vehicle_Damage exactly; every other feature is
    /// balanced across both classes.
    fn write_dataset(path: &std::path::Path, pairs: usize) {
        let mut csv = String::from("_id,Gender,Age,Vehicle_Damage,Response\n");
        for i in 0..pairs {
            let gender = if i % 2 == 0 { "Male" } else { "Female" };
            let age = 20 + (i * 7) % 40;
            csv.push_str(&format!("p{i},{gender},{age},Yes,1\n"));
            csv.push_str(&format!("n{i},{gender},{age},No,0\n"));
        }
        fs::write(path, csv).unwrap();
    }

    #[test]
    fn test_trains_scores_and_saves() {
        let dir = tempdir().unwrap();
        let train = dir.path().join("train.csv");
        let test = dir.path().join("test.csv");
        write_dataset(&train, 20);
        write_dataset(&test, 5);

        let data = DataSettings {
            train_file_path: train,
            test_file_path: test,
            ..DataSettings::default()
        };
        let training = TrainingSettings {
            standard_columns: vec!["Age".into()],
            minmax_columns: vec![],
            ..TrainingSettings::default()
        };
        let encoder = FeatureEncoder::default();
        let model_path = dir.path().join("model").join("model.bin");

        let artifact = ModelTrainer::new(&data, &training, &encoder, model_path.clone())
            .initiate_model_trainer()
            .unwrap();

        assert!(artifact.metric_artifact.f1_score > 0.9);
        assert_eq!(artifact.trained_model_file_path, model_path);
        let model = TrainedModel::load_from(&model_path).unwrap();
        assert_eq!(model.expected_columns(), &["Gender", "Age", "Vehicle_Damage_Yes"]);
    }

    #[test]
    fn test_below_expected_score_is_rejected() {
        let dir = tempdir().unwrap();
        let train = dir.path().join("train.csv");
        write_dataset(&train, 10);

        let data = DataSettings {
            train_file_path: train.clone(),
            test_file_path: train,
            ..DataSettings::default()
        };
        let training = TrainingSettings {
            expected_score: 1.1,
            ..TrainingSettings::default()
        };
        let encoder = FeatureEncoder::default();
        let model_path = dir.path().join("model.bin");

        let err = ModelTrainer::new(&data, &training, &encoder, model_path.clone())
            .initiate_model_trainer()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Training(_)));
        assert!(!model_path.exists());
    }
}
