//! Durable per-framework job queues
//!
//! Each framework owns one named queue (`<name>-jobs`) with at-least-once
//! delivery. The dispatch loop inspects depth before publishing and the
//! consumer processes one delivery at a time.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Conventional name of a framework's job queue.
pub fn job_queue_name(framework: &str) -> String {
    format!("{framework}-jobs")
}

/// A single message handed to a subscriber.
///
/// The tag identifies the delivery for acknowledgement, not the message:
/// a redelivered message carries a fresh tag.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub tag: u64,
    pub payload: Value,
}

/// The queue transport capability.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Passive, non-destructive depth inspection.
    ///
    /// Counts ready plus unacknowledged deliveries, so a queue being worked
    /// through still reports nonzero depth.
    async fn depth(&self, queue: &str) -> Result<u64>;

    /// Publish a message to the named queue.
    async fn publish(&self, queue: &str, payload: Value) -> Result<()>;

    /// Open a subscription with a prefetch of one in-flight delivery.
    async fn subscribe(&self, queue: &str) -> Result<Box<dyn Subscription>>;
}

/// One consumer's view of a queue.
///
/// At most one delivery is outstanding at a time: `next` does not yield a
/// second delivery until the first is acknowledged.
#[async_trait]
pub trait Subscription: Send {
    /// Await the next delivery. `None` means the bus has shut down.
    async fn next(&mut self) -> Result<Option<Delivery>>;

    /// Acknowledge a delivery by tag.
    async fn ack(&mut self, tag: u64) -> Result<()>;
}
