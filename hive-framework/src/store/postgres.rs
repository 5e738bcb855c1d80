//! Postgres-backed job store

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::store::{JobStore, StoreError};

/// Create the shared connection pool for the job store.
pub async fn create_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.url)
        .await
}

/// [`JobStore`] over a Postgres pool.
///
/// Queries acquire a connection from the pool per call and release it on
/// drop, so frameworks share the pool without holding sessions across
/// cycles.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn active_job_ids(
        &self,
        job_type: &str,
        datacenter: &str,
    ) -> Result<Vec<Uuid>, StoreError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT j.id
            FROM jobs j
            JOIN job_records r ON r.job_id = j.id
            WHERE r.job_type = $1
              AND j.datacenter = $2
              AND j.stopped_at IS NULL
            ORDER BY j.created_at ASC
            "#,
        )
        .bind(job_type)
        .bind(datacenter)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id UUID PRIMARY KEY,
                datacenter VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                stopped_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_records (
                job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                job_type VARCHAR(255) NOT NULL,
                PRIMARY KEY (job_id, job_type)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_jobs_datacenter_active ON jobs(datacenter) WHERE stopped_at IS NULL",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_job_records_type ON job_records(job_type)")
            .execute(&self.pool)
            .await?;

        tracing::info!("job schema ensured");
        Ok(())
    }
}
