//! Worker domain model
//!
//! Represents a worker node as reported by the manager. Workers are not
//! persisted locally; they are rebuilt from `worker.get` replies and owned
//! transiently by the caller.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A worker that can run tasks for a framework
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    /// Unique identifier assigned by the manager
    pub id: Uuid,

    /// Address tasks are launched against (host:port)
    pub target: String,

    /// Name of the framework this worker belongs to
    pub framework: String,

    /// Free-form scheduling tags
    pub tags: Vec<String>,
}
