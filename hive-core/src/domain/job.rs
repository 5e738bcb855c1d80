//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unit of work scoped to a datacenter.
///
/// Jobs are owned by the persistence layer; frameworks only read them and
/// attach a job-type side record. A job is active while `stopped_at` is
/// unset and its datacenter matches the framework's configured datacenter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub datacenter: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub stopped_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Job {
    /// Whether this job should still be dispatched for the given datacenter.
    pub fn is_active_in(&self, datacenter: &str) -> bool {
        self.stopped_at.is_none() && self.datacenter == datacenter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(datacenter: &str, stopped: bool) -> Job {
        Job {
            id: Uuid::new_v4(),
            datacenter: datacenter.to_string(),
            created_at: chrono::Utc::now(),
            stopped_at: stopped.then(chrono::Utc::now),
        }
    }

    #[test]
    fn active_requires_matching_datacenter() {
        assert!(job("dc1", false).is_active_in("dc1"));
        assert!(!job("dc2", false).is_active_in("dc1"));
    }

    #[test]
    fn stopped_job_is_not_active() {
        assert!(!job("dc1", true).is_active_in("dc1"));
    }
}
