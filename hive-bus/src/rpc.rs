//! Correlated RPC over the bus
//!
//! Every manager interaction (register, validate-token, launch-task,
//! get-workers) follows one template: build a request payload, publish it
//! to obtain a correlation identifier, then block for the matching reply.
//! [`RpcPublisher`] is that template; [`decode_reply`] turns a raw reply
//! into a typed body after checking the status envelope.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::error::Result;

/// How long a caller waits for a reply unless it overrides the wait.
pub const DEFAULT_RPC_WAIT: Duration = Duration::from_secs(30);

/// A transport that can send correlated requests and surface their replies.
///
/// Routing is a `service` / `method` pair (e.g. `security` / `validate`).
/// `wait_reply` returning `None` covers both a timeout and transport loss —
/// callers treat the two identically.
#[async_trait]
pub trait RpcChannel: Send + Sync {
    /// Publish a request; returns the correlation id its reply will carry.
    async fn publish(&self, service: &str, method: &str, payload: Value) -> Result<Uuid>;

    /// Block for the reply matching `correlation_id`, up to `wait`.
    async fn wait_reply(&self, correlation_id: Uuid, wait: Duration) -> Option<Value>;
}

/// The publish / get_data pair bound to one routing key.
pub struct RpcPublisher {
    channel: Arc<dyn RpcChannel>,
    service: String,
    method: String,
}

impl RpcPublisher {
    pub fn new(
        channel: Arc<dyn RpcChannel>,
        service: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            service: service.into(),
            method: method.into(),
        }
    }

    /// Publish a typed request payload; returns the correlation id.
    pub async fn publish<T: Serialize>(&self, payload: &T) -> Result<Uuid> {
        tracing::debug!(
            service = %self.service,
            method = %self.method,
            "publishing rpc request"
        );
        let value = serde_json::to_value(payload)?;
        self.channel
            .publish(&self.service, &self.method, value)
            .await
    }

    /// Block for the reply to a previous [`publish`](Self::publish).
    ///
    /// `None` means no reply arrived in time — indistinguishable from a
    /// transport failure, by design.
    pub async fn get_data(&self, correlation_id: Uuid, wait: Duration) -> Option<Value> {
        self.channel.wait_reply(correlation_id, wait).await
    }
}

/// A reply arrived but could not be used.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The manager answered with a non-success status code
    #[error("manager returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// The reply did not match the expected shape
    #[error("malformed reply: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(serde::Deserialize)]
struct Envelope {
    code: u16,
    #[serde(default)]
    error: Option<String>,
}

/// Check the status envelope of a reply and deserialize its typed body.
///
/// Reply bodies sit alongside the envelope fields in the same JSON object,
/// so the body type is deserialized from the full reply.
pub fn decode_reply<T: DeserializeOwned>(reply: Value) -> std::result::Result<T, ReplyError> {
    let envelope: Envelope = serde_json::from_value(reply.clone())?;

    if envelope.code != 200 {
        return Err(ReplyError::Status {
            code: envelope.code,
            message: envelope
                .error
                .unwrap_or_else(|| "unknown manager error".to_string()),
        });
    }

    Ok(serde_json::from_value(reply)?)
}
