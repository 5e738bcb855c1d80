//! Typed errors for manager interactions
//!
//! Each RPC surfaces its own error so callers can react per operation. A
//! non-success manager status carries the manager's message and code
//! verbatim.

use hive_bus::{BusError, ReplyError};
use thiserror::Error;

/// Launching a task via the manager failed.
#[derive(Debug, Error)]
pub enum LaunchTaskError {
    #[error("error publishing launch task rpc: {0}")]
    Publish(#[from] BusError),

    #[error("did not receive a reply from a manager - launch task")]
    NoReply,

    #[error("manager refused task launch (status {code}): {message}")]
    Refused { code: u16, message: String },

    #[error("malformed launch task reply: {0}")]
    Malformed(serde_json::Error),
}

impl From<ReplyError> for LaunchTaskError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Status { code, message } => Self::Refused { code, message },
            ReplyError::Malformed(err) => Self::Malformed(err),
        }
    }
}

/// Worker discovery via the manager failed.
#[derive(Debug, Error)]
pub enum GetWorkersError {
    #[error("error publishing get workers rpc: {0}")]
    Publish(#[from] BusError),

    #[error("did not receive a reply from a manager - get workers")]
    NoReply,

    #[error("manager refused worker discovery (status {code}): {message}")]
    Refused { code: u16, message: String },

    #[error("malformed get workers reply: {0}")]
    Malformed(serde_json::Error),
}

impl From<ReplyError> for GetWorkersError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Status { code, message } => Self::Refused { code, message },
            ReplyError::Malformed(err) => Self::Malformed(err),
        }
    }
}
