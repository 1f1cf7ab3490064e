// src/pipeline/pusher.rs
use crate::error::Result;
use crate::pipeline::artifacts::{ModelEvaluationArtifact, ModelPusherArtifact};
use crate::registry::{ArtifactLocation, ModelHandle};
use tracing::info;

/// Promotes an accepted candidate into the production slot.
pub struct ModelPusher<'a> {
    production: &'a mut ModelHandle,
    remove_local: bool,
}

impl<'a> ModelPusher<'a> {
    pub fn new(production: &'a mut ModelHandle, remove_local: bool) -> Self {
        Self {
            production,
            remove_local,
        }
    }

    /// Upload the candidate when the evaluation accepted it. Rejected
    /// candidates leave the registry untouched and yield `None`.
    pub async fn initiate_model_pusher(
        &mut self,
        evaluation: &ModelEvaluationArtifact,
    ) -> Result<Option<ModelPusherArtifact>> {
        if !evaluation.is_accepted {
            info!("Trained model was not accepted, production model is unchanged");
            return Ok(None);
        }

        self.production
            .save(&evaluation.candidate_model_path, self.remove_local)
            .await?;

        let backend = match self.production.location() {
            ArtifactLocation::Local(_) => "local".to_string(),
            ArtifactLocation::Registry { store, .. } => store.backend().to_string(),
        };

        Ok(Some(ModelPusherArtifact {
            backend,
            remote_model_path: evaluation.remote_model_path.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogisticRegression, Preprocessor, TrainedModel};
    use crate::registry::FsStore;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn candidate(path: &std::path::Path) {
        TrainedModel::new(
            Preprocessor::passthrough(vec!["x".into()]),
            LogisticRegression::from_parameters(vec![1.0], 0.0),
        )
        .unwrap()
        .save_to(path)
        .unwrap();
    }

    fn evaluation(path: &std::path::Path, accepted: bool) -> ModelEvaluationArtifact {
        ModelEvaluationArtifact {
            is_accepted: accepted,
            remote_model_path: "production/model.bin".into(),
            candidate_model_path: path.to_path_buf(),
            score_delta: if accepted { 0.1 } else { -0.1 },
        }
    }

    #[tokio::test]
    async fn test_accepted_candidate_is_pushed() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("model.bin");
        candidate(&local);

        let store = Arc::new(FsStore::new(dir.path().join("registry")));
        let mut production = ModelHandle::registry(store, "production/model.bin");

        let pushed = ModelPusher::new(&mut production, false)
            .initiate_model_pusher(&evaluation(&local, true))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(pushed.backend, "fs");
        assert!(production.is_present().await.unwrap());
        assert!(local.exists());
    }

    #[tokio::test]
    async fn test_rejected_candidate_is_not_pushed() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("model.bin");
        candidate(&local);

        let store = Arc::new(FsStore::new(dir.path().join("registry")));
        let mut production = ModelHandle::registry(store, "production/model.bin");

        let pushed = ModelPusher::new(&mut production, true)
            .initiate_model_pusher(&evaluation(&local, false))
            .await
            .unwrap();

        assert!(pushed.is_none());
        assert!(!production.is_present().await.unwrap());
        assert!(local.exists());
    }
}
