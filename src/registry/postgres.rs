// src/registry/postgres.rs
use crate::error::{PipelineError, Result};
use crate::registry::ObjectStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};

const BACKEND: &str = "postgres";

fn unavailable(e: impl ToString) -> PipelineError {
    PipelineError::storage(BACKEND, e)
}

/// Registry stored in a `model_registry` table, one BYTEA per key.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn new(url: &str, max_connections: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections as u32)
            .connect(url)
            .await
            .map_err(|e| unavailable(format!("failed to create database connection pool: {}", e)))?;

        info!("Connected to Postgres model registry");
        Ok(Self { pool })
    }

    // Create the registry table if it doesn't exist
    pub async fn init_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS model_registry (
                key VARCHAR PRIMARY KEY,
                artifact BYTEA NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!("Model registry table ready");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for PostgresStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM model_registry WHERE key = $1)")
            .bind(key)
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(row.get(0))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT artifact FROM model_registry WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(row.map(|r| r.get(0)))
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        sqlx::query(
            "INSERT INTO model_registry (key, artifact, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key)
            DO UPDATE SET artifact = EXCLUDED.artifact, updated_at = EXCLUDED.updated_at",
        )
        .bind(key)
        .bind(bytes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!("Stored {} bytes under {}", bytes.len(), key);
        Ok(())
    }
}
