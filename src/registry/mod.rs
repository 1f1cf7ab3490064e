// src/registry/mod.rs
pub mod fs;
pub mod handle;
pub mod postgres;
pub mod redis;

use crate::config::{RegistryBackend, RegistrySettings};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub use self::fs::FsStore;
pub use self::handle::{ArtifactLocation, ModelHandle};
pub use self::postgres::PostgresStore;
pub use self::redis::RedisStore;

/// Key/value storage for model artifacts.
///
/// `exists` and `get` report "not found" as `false` / `None`; an `Err` always
/// means the store itself could not be reached or refused the request.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name used in errors and logs.
    fn backend(&self) -> &'static str;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Open the configured registry backend. The returned client is owned by the
/// caller and passed explicitly to whatever needs it.
pub async fn connect(settings: &RegistrySettings) -> Result<Arc<dyn ObjectStore>> {
    info!("Connecting to {:?} model registry", settings.backend);

    let store: Arc<dyn ObjectStore> = match settings.backend {
        RegistryBackend::Fs => Arc::new(FsStore::new(&settings.root)),
        RegistryBackend::Redis => {
            let url = settings
                .url
                .as_deref()
                .ok_or_else(|| PipelineError::storage("redis", "no registry url or credentials configured"))?;
            Arc::new(RedisStore::new(url, &settings.key_prefix, settings.max_connections).await?)
        }
        RegistryBackend::Postgres => {
            let url = settings
                .url
                .as_deref()
                .ok_or_else(|| PipelineError::storage("postgres", "no registry url or credentials configured"))?;
            let store = PostgresStore::new(url, settings.max_connections).await?;
            store.init_tables().await?;
            Arc::new(store)
        }
    };

    Ok(store)
}
