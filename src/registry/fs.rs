// src/registry/fs.rs
use crate::error::{PipelineError, Result};
use crate::registry::ObjectStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

const BACKEND: &str = "fs";

/// Registry rooted in a local (or mounted) directory; keys are relative paths.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve a key under the root, refusing anything that could escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        if key.is_empty() || rel.is_absolute() {
            return Err(PipelineError::storage(BACKEND, format!("invalid key {:?}", key)));
        }
        if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(PipelineError::storage(BACKEND, format!("key {:?} escapes the registry root", key)));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| PipelineError::storage(BACKEND, format!("{}: {}", path.display(), e)))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PipelineError::storage(BACKEND, format!("{}: {}", path.display(), e))),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        let io_err = |e: std::io::Error| PipelineError::storage(BACKEND, format!("{}: {}", path.display(), e));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        // write then rename so readers never see a partial artifact
        let tmp = path.with_extension("partial");
        fs::write(&tmp, bytes).await.map_err(io_err)?;
        fs::rename(&tmp, &path).await.map_err(io_err)?;

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_get_exists() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());

        assert!(!store.exists("prod/model.bin").await.unwrap());
        assert_eq!(store.get("prod/model.bin").await.unwrap(), None);

        store.put("prod/model.bin", b"abc").await.unwrap();
        assert!(store.exists("prod/model.bin").await.unwrap());
        assert_eq!(store.get("prod/model.bin").await.unwrap(), Some(b"abc".to_vec()));

        store.put("prod/model.bin", b"xyz").await.unwrap();
        assert_eq!(store.get("prod/model.bin").await.unwrap(), Some(b"xyz".to_vec()));
    }

    #[tokio::test]
    async fn test_escaping_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FsStore::new(dir.path());

        for key in ["../outside.bin", "/etc/passwd", "a/../../b", ""] {
            assert!(matches!(
                store.put(key, b"x").await,
                Err(PipelineError::StorageUnavailable { backend: "fs", .. })
            ));
        }
    }
}
