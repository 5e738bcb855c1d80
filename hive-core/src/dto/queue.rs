//! Job queue payloads

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit placed on a framework's job queue.
///
/// Carries only the job identifier; the consumer loads everything else it
/// needs. Ephemeral — exists only between publish and acknowledged
/// consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub job_id: Uuid,
}

impl JobRef {
    pub fn new(job_id: Uuid) -> Self {
        Self { job_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_job_id_only() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(JobRef::new(id)).unwrap();
        assert_eq!(json, serde_json::json!({ "job_id": id }));
    }
}
