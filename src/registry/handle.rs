// src/registry/handle.rs
use crate::data::matrix::FeatureMatrix;
use crate::error::{PipelineError, Result};
use crate::model::estimator::TrainedModel;
use crate::registry::ObjectStore;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

/// Where a model artifact lives.
#[derive(Clone)]
pub enum ArtifactLocation {
    /// Produced by a local training run.
    Local(PathBuf),
    /// Held by the model registry under `key`.
    Registry { store: Arc<dyn ObjectStore>, key: String },
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLocation::Local(path) => write!(f, "{}", path.display()),
            ArtifactLocation::Registry { store, key } => write!(f, "{}://{}", store.backend(), key),
        }
    }
}

impl fmt::Debug for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactLocation({})", self)
    }
}

/// A trained model that can score rows, fetched at most once.
///
/// `is_present` never downloads anything, so callers that only need to know
/// whether a model exists do not pay for deserialization.
#[derive(Debug)]
pub struct ModelHandle {
    location: ArtifactLocation,
    model: OnceCell<TrainedModel>,
}

impl ModelHandle {
    pub fn new(location: ArtifactLocation) -> Self {
        Self {
            location,
            model: OnceCell::new(),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(ArtifactLocation::Local(path.into()))
    }

    pub fn registry(store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self::new(ArtifactLocation::Registry {
            store,
            key: key.into(),
        })
    }

    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }

    /// Whether an artifact exists. Absence is `Ok(false)`; only an
    /// unreachable store is an error.
    pub async fn is_present(&self) -> Result<bool> {
        match &self.location {
            ArtifactLocation::Local(path) => tokio::fs::try_exists(path)
                .await
                .map_err(|e| PipelineError::storage("local", format!("{}: {}", path.display(), e))),
            ArtifactLocation::Registry { store, key } => store.exists(key).await,
        }
    }

    /// Fetch and decode the artifact on first use; later calls reuse it.
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn load(&self) -> Result<&TrainedModel> {
        self.model.get_or_try_init(|| self.fetch()).await
    }

    async fn fetch(&self) -> Result<TrainedModel> {
        info!("Loading model from {}", self.location);

        match &self.location {
            ArtifactLocation::Local(path) => TrainedModel::load_from(path),
            ArtifactLocation::Registry { store, key } => {
                let bytes = store.get(key).await?.ok_or_else(|| PipelineError::ModelLoad {
                    location: self.location.to_string(),
                    reason: "artifact not found".to_string(),
                })?;
                TrainedModel::from_bytes(&bytes, &self.location.to_string())
            }
        }
    }

    /// Score encoded rows with the preprocessing stage then the classifier.
    pub async fn predict(&self, x: &FeatureMatrix) -> Result<Vec<u8>> {
        self.load().await?.predict(x)
    }

    /// Upload a local artifact to this handle's location. The local file is
    /// removed only after the upload succeeded.
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn save(&mut self, local_path: &Path, remove_local: bool) -> Result<()> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| PipelineError::ModelLoad {
            location: local_path.display().to_string(),
            reason: e.to_string(),
        })?;

        match &self.location {
            ArtifactLocation::Local(path) => {
                if path.as_path() != local_path {
                    tokio::fs::write(path, &bytes)
                        .await
                        .map_err(|source| PipelineError::ArtifactWrite {
                            path: path.clone(),
                            source,
                        })?;
                }
            }
            ArtifactLocation::Registry { store, key } => store.put(key, &bytes).await?,
        }
        info!("Uploaded {} to {}", local_path.display(), self.location);

        // the stored artifact changed, drop whatever was cached
        self.model.take();

        let uploaded_onto_itself = matches!(&self.location, ArtifactLocation::Local(path) if path.as_path() == local_path);
        if remove_local && !uploaded_onto_itself {
            tokio::fs::remove_file(local_path)
                .await
                .map_err(|source| PipelineError::ArtifactWrite {
                    path: local_path.to_path_buf(),
                    source,
                })?;
            info!("Removed local artifact {}", local_path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::classifier::LogisticRegression;
    use crate::model::preprocess::Preprocessor;
    use crate::registry::FsStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    struct CountingStore {
        inner: FsStore,
        gets: AtomicUsize,
        fail_puts: bool,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        fn backend(&self) -> &'static str {
            "counting"
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            self.inner.exists(key).await
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
            if self.fail_puts {
                return Err(PipelineError::storage("counting", "connection refused"));
            }
            self.inner.put(key, bytes).await
        }
    }

    fn model() -> TrainedModel {
        TrainedModel::new(
            Preprocessor::passthrough(vec!["x".into()]),
            LogisticRegression::from_parameters(vec![2.0], -1.0),
        )
        .unwrap()
    }

    fn store(root: &Path, fail_puts: bool) -> Arc<CountingStore> {
        Arc::new(CountingStore {
            inner: FsStore::new(root),
            gets: AtomicUsize::new(0),
            fail_puts,
        })
    }

    #[tokio::test]
    async fn test_load_fetches_at_most_once() {
        let dir = tempdir().unwrap();
        let store = store(dir.path(), false);
        store.put("prod/model.bin", &model().to_bytes().unwrap()).await.unwrap();

        let handle = ModelHandle::registry(store.clone(), "prod/model.bin");
        assert!(handle.is_present().await.unwrap());
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);

        let x = FeatureMatrix::new(vec!["x".into()], vec![vec![0.0], vec![1.0]]).unwrap();
        assert_eq!(handle.predict(&x).await.unwrap(), vec![0, 1]);
        assert_eq!(handle.load().await.unwrap(), &model());
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_model() {
        let dir = tempdir().unwrap();
        let handle = ModelHandle::registry(store(dir.path(), false), "prod/model.bin");

        assert!(!handle.is_present().await.unwrap());
        assert!(matches!(handle.load().await, Err(PipelineError::ModelLoad { .. })));
    }

    #[tokio::test]
    async fn test_save_removes_local_copy_after_upload() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("candidate.bin");
        model().save_to(&local).unwrap();

        let store = store(&dir.path().join("registry"), false);
        let mut handle = ModelHandle::registry(store, "prod/model.bin");
        handle.save(&local, true).await.unwrap();

        assert!(!local.exists());
        assert!(handle.is_present().await.unwrap());
        assert_eq!(handle.load().await.unwrap(), &model());
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_local_copy() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("candidate.bin");
        model().save_to(&local).unwrap();

        let mut handle = ModelHandle::registry(store(&dir.path().join("registry"), true), "prod/model.bin");
        let err = handle.save(&local, true).await.unwrap_err();

        assert!(matches!(err, PipelineError::StorageUnavailable { .. }));
        assert!(local.exists());
    }

    #[tokio::test]
    async fn test_local_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let handle = ModelHandle::local(&path);
        assert!(!handle.is_present().await.unwrap());

        model().save_to(&path).unwrap();
        assert!(handle.is_present().await.unwrap());
        assert_eq!(handle.load().await.unwrap(), &model());
    }
}
