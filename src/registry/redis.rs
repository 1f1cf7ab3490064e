// src/registry/redis.rs
use crate::error::{PipelineError, Result};
use crate::registry::ObjectStore;
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, PoolConfig, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info};

const BACKEND: &str = "redis";

fn unavailable(e: impl ToString) -> PipelineError {
    PipelineError::storage(BACKEND, e)
}

/// Registry backed by Redis; each artifact is one binary value.
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisStore {
    pub async fn new(url: &str, key_prefix: &str, max_connections: usize) -> Result<Self> {
        let mut cfg = Config::from_url(url);
        cfg.pool = Some(PoolConfig::new(max_connections));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| unavailable(format!("failed to create connection pool: {}", e)))?;

        // Test connection
        let mut conn = pool.get().await.map_err(unavailable)?;
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)?;

        info!("Connected to Redis model registry");

        Ok(Self {
            pool,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectStore for RedisStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.map_err(unavailable)?;
        let present: bool = conn.exists(self.full_key(key)).await.map_err(unavailable)?;
        Ok(present)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.pool.get().await.map_err(unavailable)?;
        let bytes: Option<Vec<u8>> = conn.get(self.full_key(key)).await.map_err(unavailable)?;
        Ok(bytes)
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(unavailable)?;
        conn.set::<_, _, ()>(self.full_key(key), bytes)
            .await
            .map_err(unavailable)?;
        debug!("Stored {} bytes under {}", bytes.len(), self.full_key(key));
        Ok(())
    }
}
