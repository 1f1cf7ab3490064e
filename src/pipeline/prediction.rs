// src/pipeline/prediction.rs
use crate::data::frame::Frame;
use crate::data::loader::read_csv;
use crate::encoding::FeatureEncoder;
use crate::error::{PipelineError, Result};
use crate::registry::ModelHandle;
use std::io;
use std::path::Path;
use tracing::info;

/// Scores rows with a stored model, e.g. the production one.
pub struct PredictionPipeline<'a> {
    encoder: &'a FeatureEncoder,
    model: &'a ModelHandle,
}

impl<'a> PredictionPipeline<'a> {
    pub fn new(encoder: &'a FeatureEncoder, model: &'a ModelHandle) -> Self {
        Self { encoder, model }
    }

    /// Predict every row of `input`. A target column, if the file has one, is
    /// ignored.
    pub async fn predict_file(&self, input: &Path, target_column: &str) -> Result<Vec<u8>> {
        let frame = read_csv(input)?;
        let predictions = self.predict_frame(frame, target_column).await?;
        info!("Scored {} rows from {}", predictions.len(), input.display());
        Ok(predictions)
    }

    async fn predict_frame(&self, mut frame: Frame, target_column: &str) -> Result<Vec<u8>> {
        frame.drop_column(target_column);

        let model = self.model.load().await?;
        let x = self.encoder.encode(&frame)?.reconcile(model.expected_columns())?;
        model.predict(&x)
    }

    /// Predict `input` and write `id,prediction` rows to `output`. The id
    /// column is copied through when present, otherwise the row number is used.
    pub async fn predict_to_csv(&self, input: &Path, output: &Path, target_column: &str) -> Result<usize> {
        let frame = read_csv(input)?;
        let id_column = &self.encoder.config().id_column;
        let ids: Vec<String> = match frame.column(id_column) {
            Some(column) => column.values.iter().map(|v| v.to_string()).collect(),
            None => (0..frame.n_rows()).map(|i| i.to_string()).collect(),
        };

        let predictions = self.predict_frame(frame, target_column).await?;
        info!("Scored {} rows from {}, writing {}", predictions.len(), input.display(), output.display());

        let write_err = |e: csv::Error| PipelineError::ArtifactWrite {
            path: output.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, e),
        };

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PipelineError::ArtifactWrite {
                path: output.to_path_buf(),
                source,
            })?;
        }

        let mut writer = csv::Writer::from_path(output).map_err(write_err)?;
        writer.write_record([id_column.as_str(), "prediction"]).map_err(write_err)?;
        for (id, prediction) in ids.iter().zip(&predictions) {
            let prediction = prediction.to_string();
            writer
                .write_record([id.as_str(), prediction.as_str()])
                .map_err(write_err)?;
        }
        writer.flush().map_err(|source| PipelineError::ArtifactWrite {
            path: output.to_path_buf(),
            source,
        })?;

        Ok(predictions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogisticRegression, Preprocessor, TrainedModel};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_predict_to_csv_keeps_ids() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.bin");
        TrainedModel::new(
            Preprocessor::passthrough(vec!["Vehicle_Damage_Yes".into()]),
            LogisticRegression::from_parameters(vec![10.0], -5.0),
        )
        .unwrap()
        .save_to(&model_path)
        .unwrap();

        let input = dir.path().join("input.csv");
        fs::write(&input, "_id,Gender,Vehicle_Damage,Response\na,Male,Yes,1\nb,Female,No,0\nc,Male,Yes,0\n").unwrap();
        let output = dir.path().join("out").join("predictions.csv");

        let encoder = FeatureEncoder::default();
        let handle = ModelHandle::local(&model_path);
        let n = PredictionPipeline::new(&encoder, &handle)
            .predict_to_csv(&input, &output, "Response")
            .await
            .unwrap();

        assert_eq!(n, 3);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "_id,prediction\na,1\nb,0\nc,1\n"
        );
    }

    #[tokio::test]
    async fn test_single_row_uses_its_own_category() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.bin");
        TrainedModel::new(
            Preprocessor::passthrough(vec!["Vehicle_Damage_Yes".into()]),
            LogisticRegression::from_parameters(vec![10.0], -5.0),
        )
        .unwrap()
        .save_to(&model_path)
        .unwrap();

        let input = dir.path().join("input.csv");
        fs::write(&input, "_id,Gender,Vehicle_Damage\na,Male,Yes\n").unwrap();

        let encoder = FeatureEncoder::default();
        let handle = ModelHandle::local(&model_path);
        let predictions = PredictionPipeline::new(&encoder, &handle)
            .predict_file(&input, "Response")
            .await
            .unwrap();
        assert_eq!(predictions, vec![1]);
    }

    #[tokio::test]
    async fn test_missing_model_is_a_load_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("input.csv");
        fs::write(&input, "Gender,Vehicle_Damage\nMale,Yes\n").unwrap();

        let encoder = FeatureEncoder::default();
        let handle = ModelHandle::local(dir.path().join("absent.bin"));
        let err = PredictionPipeline::new(&encoder, &handle)
            .predict_file(&input, "Response")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ModelLoad { .. }));
    }
}
