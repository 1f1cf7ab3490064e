// src/model/estimator.rs
use crate::data::matrix::FeatureMatrix;
use crate::error::{PipelineError, Result};
use crate::model::classifier::LogisticRegression;
use crate::model::preprocess::Preprocessor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

const ARTIFACT_MAGIC: &[u8; 4] = b"MPM1";

/// A trained model: the fitted preprocessing stage composed with the fitted
/// classifier. Serialized together as one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    preprocessor: Preprocessor,
    classifier: LogisticRegression,
}

impl TrainedModel {
    pub fn new(preprocessor: Preprocessor, classifier: LogisticRegression) -> Result<Self> {
        let features = preprocessor.feature_names().len();
        if classifier.weights().len() != features {
            return Err(PipelineError::Inference {
                expected: features,
                found: classifier.weights().len(),
            });
        }
        Ok(Self {
            preprocessor,
            classifier,
        })
    }

    /// Column layout the preprocessing stage was fit on.
    pub fn expected_columns(&self) -> &[String] {
        self.preprocessor.feature_names()
    }

    /// Preprocess then classify. `x` must already be encoded and reconciled
    /// against [`Self::expected_columns`].
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>> {
        debug!("Scoring {} rows", x.n_rows());
        let transformed = self.preprocessor.transform(x)?;
        self.classifier.predict(&transformed)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let body = bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| PipelineError::Training(format!("failed to serialize model: {}", e)))?;
        let mut bytes = Vec::with_capacity(ARTIFACT_MAGIC.len() + body.len());
        bytes.extend_from_slice(ARTIFACT_MAGIC);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode an artifact. `location` names where the bytes came from.
    pub fn from_bytes(bytes: &[u8], location: &str) -> Result<Self> {
        let corrupt = |reason: String| PipelineError::ModelLoad {
            location: location.to_string(),
            reason,
        };

        let body = bytes
            .strip_prefix(ARTIFACT_MAGIC.as_slice())
            .ok_or_else(|| corrupt("not a model artifact".to_string()))?;

        let (model, read): (Self, usize) =
            bincode::serde::decode_from_slice(body, bincode::config::standard())
                .map_err(|e| corrupt(format!("corrupt artifact: {}", e)))?;

        if read != body.len() {
            return Err(corrupt(format!("{} trailing bytes", body.len() - read)));
        }
        if model.classifier.weights().len() != model.preprocessor.feature_names().len() {
            return Err(corrupt("classifier and preprocessor disagree on width".to_string()));
        }

        Ok(model)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PipelineError::ArtifactWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, bytes).map_err(|source| PipelineError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let location = path.display().to_string();
        let bytes = fs::read(path).map_err(|e| PipelineError::ModelLoad {
            location: location.clone(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes, &location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::preprocess::Scaling;
    use tempfile::tempdir;

    fn model() -> TrainedModel {
        let pre = Preprocessor::from_parts(
            vec!["Age".into(), "Flag".into()],
            vec![
                Scaling::Standard {
                    mean: 33.333333333333336,
                    scale: 0.1 + 0.2,
                },
                Scaling::Passthrough,
            ],
        )
        .unwrap();
        TrainedModel::new(pre, LogisticRegression::from_parameters(vec![0.7, -1.3], 0.01)).unwrap()
    }

    fn sample() -> FeatureMatrix {
        FeatureMatrix::new(
            vec!["Age".into(), "Flag".into()],
            vec![vec![33.0, 1.0], vec![34.0, 0.0], vec![33.4, 1.0], vec![20.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let original = model();
        let bytes = original.to_bytes().unwrap();
        let restored = TrainedModel::from_bytes(&bytes, "memory").unwrap();

        assert_eq!(restored, original);
        assert_eq!(restored.predict(&sample()).unwrap(), original.predict(&sample()).unwrap());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        model().save_to(&path).unwrap();
        assert_eq!(TrainedModel::load_from(&path).unwrap(), model());
    }

    #[test]
    fn test_corrupt_bytes_are_model_load_errors() {
        assert!(matches!(
            TrainedModel::from_bytes(b"garbage", "memory"),
            Err(PipelineError::ModelLoad { .. })
        ));

        let mut bytes = model().to_bytes().unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            TrainedModel::from_bytes(&bytes, "memory"),
            Err(PipelineError::ModelLoad { .. })
        ));

        let mut bytes = model().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            TrainedModel::from_bytes(&bytes, "memory"),
            Err(PipelineError::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_predict_rejects_reordered_columns() {
        let x = FeatureMatrix::new(vec!["Flag".into(), "Age".into()], vec![vec![1.0, 30.0]]).unwrap();
        assert!(model().predict(&x).is_err());
    }

    #[test]
    fn test_missing_file_is_model_load_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            TrainedModel::load_from(&dir.path().join("absent.bin")),
            Err(PipelineError::ModelLoad { .. })
        ));
    }
}
