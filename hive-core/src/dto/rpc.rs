//! RPC payloads exchanged with the manager
//!
//! Every manager interaction is a correlated request/reply pair. Replies
//! carry a `code` field plus either the typed body below or an `error`
//! message; the envelope itself is handled by the bus layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::task::TaskStatus;
use crate::domain::user::UserInfo;
use crate::domain::worker::Worker;

/// `framework.register` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

/// `framework.register` reply body — the assigned framework identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReply {
    pub id: Uuid,
}

/// `security.validate` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

/// `security.validate` reply body — the resolved caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateReply {
    pub user: UserInfo,
}

/// `task.launch` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchTaskRequest {
    pub task_id: Uuid,
    pub worker_id: Uuid,
}

/// `task.launch` reply body — the manager-reported task status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchTaskReply {
    pub status: TaskStatus,
}

/// `worker.get` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWorkersRequest {
    pub framework: String,
    pub datacenter: String,
}

/// `worker.get` reply body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetWorkersReply {
    pub workers: Vec<Worker>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_request_omits_absent_permission() {
        let req = ValidateRequest {
            token: "abc".to_string(),
            permission: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({ "token": "abc" }));
    }

    #[test]
    fn launch_reply_parses_status() {
        let reply: LaunchTaskReply =
            serde_json::from_value(serde_json::json!({ "status": "running" })).unwrap();
        assert_eq!(reply.status, TaskStatus::Running);
    }
}
