//! In-memory job store
//!
//! Backs the test suites. Tracks how often it has been queried so tests
//! can assert that backpressure skips the store entirely.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use hive_core::domain::job::Job;

use crate::store::{JobStore, StoreError};

#[derive(Default)]
struct Inner {
    jobs: Vec<(Job, String)>,
    schema_ready: bool,
    query_count: u64,
}

/// [`JobStore`] over process-local state. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job with its job-type side record.
    pub fn insert(&self, job: Job, job_type: &str) {
        self.inner
            .lock()
            .unwrap()
            .jobs
            .push((job, job_type.to_string()));
    }

    /// Set a job's stop timestamp, deactivating it.
    pub fn stop_job(&self, job_id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        for (job, _) in inner.jobs.iter_mut() {
            if job.id == job_id {
                job.stopped_at = Some(chrono::Utc::now());
            }
        }
    }

    /// Whether `ensure_schema` has run.
    pub fn schema_ready(&self) -> bool {
        self.inner.lock().unwrap().schema_ready
    }

    /// How many active-job queries have been issued.
    pub fn query_count(&self) -> u64 {
        self.inner.lock().unwrap().query_count
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn active_job_ids(
        &self,
        job_type: &str,
        datacenter: &str,
    ) -> Result<Vec<Uuid>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.query_count += 1;
        Ok(inner
            .jobs
            .iter()
            .filter(|(job, record_type)| record_type == job_type && job.is_active_in(datacenter))
            .map(|(job, _)| job.id)
            .collect())
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.inner.lock().unwrap().schema_ready = true;
        Ok(())
    }
}
