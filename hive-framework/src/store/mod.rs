//! Job store capability
//!
//! The framework runtime only reads jobs: each dispatch pass asks for the
//! active job identifiers of its job type in its datacenter. Schema
//! creation is invoked once, after successful registration, and must be
//! idempotent.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;

/// Store failures abort the current dispatch pass; they never kill the
/// loop.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Queryable job persistence.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Identifiers of jobs of `job_type` in `datacenter` that have not been
    /// stopped.
    async fn active_job_ids(
        &self,
        job_type: &str,
        datacenter: &str,
    ) -> Result<Vec<Uuid>, StoreError>;

    /// Idempotent creation of the job schema.
    async fn ensure_schema(&self) -> Result<(), StoreError>;
}
