//! In-process bus
//!
//! Implements both bus capabilities over process-local state, used by the
//! test suites and by single-node deployments that run without a broker.
//!
//! RPC replies are produced synchronously by registered responders at
//! publish time, so waiting for a reply is a map lookup; the wait duration
//! is accepted for interface parity with a real transport.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::{BusError, Result};
use crate::queue::{Delivery, JobQueue, Subscription};
use crate::rpc::RpcChannel;

/// What a registered responder does with an RPC request.
pub enum RpcOutcome {
    /// Answer with this reply payload.
    Reply(Value),
    /// Accept the publish but never reply; the caller times out.
    NoReply,
    /// Reject the publish itself, as a broken channel would.
    RejectPublish,
}

type Responder = Box<dyn FnMut(&Value) -> RpcOutcome + Send>;

#[derive(Default)]
struct QueueState {
    ready: VecDeque<(u64, Value)>,
    unacked: Vec<u64>,
    next_tag: u64,
}

#[derive(Default)]
struct Inner {
    responders: HashMap<String, Responder>,
    replies: HashMap<Uuid, Value>,
    queues: HashMap<String, QueueState>,
    closed: bool,
}

/// In-process implementation of [`RpcChannel`] and [`JobQueue`].
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MemoryBus {
    inner: Arc<Mutex<Inner>>,
    queue_activity: Arc<Notify>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            queue_activity: Arc::new(Notify::new()),
        }
    }

    /// Register a responder for a `service.method` routing key, replacing
    /// any previous one. Responders run under the bus lock; keep them short.
    pub fn respond_to(
        &self,
        service: &str,
        method: &str,
        responder: impl FnMut(&Value) -> RpcOutcome + Send + 'static,
    ) {
        self.inner
            .lock()
            .unwrap()
            .responders
            .insert(format!("{service}.{method}"), Box::new(responder));
    }

    /// Declare a queue so depth checks succeed before the first publish.
    pub fn declare_queue(&self, queue: &str) {
        self.inner
            .lock()
            .unwrap()
            .queues
            .entry(queue.to_string())
            .or_default();
    }

    /// Drop a queue and everything in it, as a broker-side deletion would.
    pub fn remove_queue(&self, queue: &str) {
        self.inner.lock().unwrap().queues.remove(queue);
    }

    /// Shut the bus down: publishes fail and subscriptions drain to `None`.
    pub fn close(&self) {
        self.inner.lock().unwrap().closed = true;
        self.queue_activity.notify_waiters();
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RpcChannel for MemoryBus {
    async fn publish(&self, service: &str, method: &str, payload: Value) -> Result<Uuid> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if inner.closed {
            return Err(BusError::Unreachable("bus closed".to_string()));
        }

        let correlation_id = Uuid::new_v4();
        let key = format!("{service}.{method}");

        // No responder on the routing key behaves like a live exchange with
        // no consumer: the publish succeeds and the caller times out.
        if let Some(responder) = inner.responders.get_mut(&key) {
            match responder(&payload) {
                RpcOutcome::Reply(reply) => {
                    inner.replies.insert(correlation_id, reply);
                }
                RpcOutcome::NoReply => {}
                RpcOutcome::RejectPublish => {
                    return Err(BusError::Channel(format!("publish rejected on {key}")));
                }
            }
        }

        Ok(correlation_id)
    }

    async fn wait_reply(&self, correlation_id: Uuid, _wait: Duration) -> Option<Value> {
        self.inner.lock().unwrap().replies.remove(&correlation_id)
    }
}

#[async_trait]
impl JobQueue for MemoryBus {
    async fn depth(&self, queue: &str) -> Result<u64> {
        let guard = self.inner.lock().unwrap();
        let state = guard
            .queues
            .get(queue)
            .ok_or_else(|| BusError::UnknownQueue(queue.to_string()))?;
        Ok((state.ready.len() + state.unacked.len()) as u64)
    }

    async fn publish(&self, queue: &str, payload: Value) -> Result<()> {
        {
            let mut guard = self.inner.lock().unwrap();
            if guard.closed {
                return Err(BusError::Unreachable("bus closed".to_string()));
            }
            let state = guard.queues.entry(queue.to_string()).or_default();
            let tag = state.next_tag;
            state.next_tag += 1;
            state.ready.push_back((tag, payload));
        }
        self.queue_activity.notify_waiters();
        Ok(())
    }

    async fn subscribe(&self, queue: &str) -> Result<Box<dyn Subscription>> {
        self.declare_queue(queue);
        Ok(Box::new(MemorySubscription {
            bus: self.clone(),
            queue: queue.to_string(),
        }))
    }
}

struct MemorySubscription {
    bus: MemoryBus,
    queue: String,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next(&mut self) -> Result<Option<Delivery>> {
        loop {
            let notified = self.bus.queue_activity.notified();
            tokio::pin!(notified);
            // Register interest before inspecting state, so a publish or
            // ack landing in between is not a lost wakeup.
            notified.as_mut().enable();

            {
                let mut guard = self.bus.inner.lock().unwrap();
                if guard.closed {
                    return Ok(None);
                }
                let state = guard.queues.entry(self.queue.clone()).or_default();
                // Prefetch of one: nothing new until the outstanding
                // delivery is acknowledged.
                if state.unacked.is_empty() {
                    if let Some((tag, payload)) = state.ready.pop_front() {
                        state.unacked.push(tag);
                        return Ok(Some(Delivery { tag, payload }));
                    }
                }
            }

            notified.await;
        }
    }

    async fn ack(&mut self, tag: u64) -> Result<()> {
        {
            let mut guard = self.bus.inner.lock().unwrap();
            let state = guard.queues.entry(self.queue.clone()).or_default();
            state.unacked.retain(|t| *t != tag);
        }
        self.bus.queue_activity.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rpc_reply_roundtrip() {
        let bus = MemoryBus::new();
        bus.respond_to("framework", "register", |req| {
            assert_eq!(req["name"], "mapreduce");
            RpcOutcome::Reply(json!({ "code": 200, "id": Uuid::new_v4() }))
        });

        let corr_id = RpcChannel::publish(&bus, "framework", "register", json!({ "name": "mapreduce" }))
            .await
            .unwrap();
        let reply = bus.wait_reply(corr_id, Duration::from_millis(10)).await;
        assert_eq!(reply.unwrap()["code"], 200);
    }

    #[tokio::test]
    async fn rejected_publish_is_a_channel_error() {
        let bus = MemoryBus::new();
        bus.respond_to("task", "launch", |_| RpcOutcome::RejectPublish);

        let err = RpcChannel::publish(&bus, "task", "launch", json!({})).await.unwrap_err();
        assert!(matches!(err, BusError::Channel(_)));
    }

    #[tokio::test]
    async fn no_reply_yields_none() {
        let bus = MemoryBus::new();
        bus.respond_to("worker", "get", |_| RpcOutcome::NoReply);

        let corr_id = RpcChannel::publish(&bus, "worker", "get", json!({})).await.unwrap();
        assert!(bus.wait_reply(corr_id, Duration::from_millis(10)).await.is_none());
    }

    #[tokio::test]
    async fn unrouted_publish_succeeds_but_never_replies() {
        let bus = MemoryBus::new();
        let corr_id = RpcChannel::publish(&bus, "worker", "get", json!({})).await.unwrap();
        assert!(bus.wait_reply(corr_id, Duration::from_millis(10)).await.is_none());
    }

    #[tokio::test]
    async fn depth_counts_ready_and_unacked() {
        let bus = MemoryBus::new();
        JobQueue::publish(&bus, "q", json!({ "job_id": 1 })).await.unwrap();
        JobQueue::publish(&bus, "q", json!({ "job_id": 2 })).await.unwrap();
        assert_eq!(bus.depth("q").await.unwrap(), 2);

        let mut sub = bus.subscribe("q").await.unwrap();
        let delivery = sub.next().await.unwrap().unwrap();
        // One in flight, one ready.
        assert_eq!(bus.depth("q").await.unwrap(), 2);

        sub.ack(delivery.tag).await.unwrap();
        assert_eq!(bus.depth("q").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn depth_of_undeclared_queue_fails() {
        let bus = MemoryBus::new();
        assert!(matches!(
            bus.depth("missing").await.unwrap_err(),
            BusError::UnknownQueue(_)
        ));
    }

    #[tokio::test]
    async fn prefetch_one_serializes_deliveries() {
        let bus = MemoryBus::new();
        JobQueue::publish(&bus, "q", json!({ "n": 1 })).await.unwrap();
        JobQueue::publish(&bus, "q", json!({ "n": 2 })).await.unwrap();

        let mut sub = bus.subscribe("q").await.unwrap();
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.payload["n"], 1);

        // Second delivery must wait for the first ack.
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), sub.next()).await;
        assert!(blocked.is_err());

        sub.ack(first.tag).await.unwrap();
        let second = sub.next().await.unwrap().unwrap();
        assert_eq!(second.payload["n"], 2);
    }

    #[tokio::test]
    async fn close_drains_subscriptions() {
        let bus = MemoryBus::new();
        let mut sub = bus.subscribe("q").await.unwrap();
        bus.close();
        assert!(sub.next().await.unwrap().is_none());
    }
}
