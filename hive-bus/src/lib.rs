//! Hive Bus
//!
//! The message-bus capability consumed by the framework runtime, expressed
//! as traits so the transport stays swappable: a correlated RPC channel
//! ([`RpcChannel`]) and a durable per-framework job queue ([`JobQueue`]).
//!
//! [`RpcPublisher`] wraps the two-step template every manager interaction
//! follows: publish a request to obtain a correlation id, then block for
//! the matching reply up to a bounded wait.
//!
//! The [`memory`] module provides an in-process implementation of both
//! traits, used by tests and single-node deployments.

pub mod error;
pub mod memory;
pub mod queue;
pub mod rpc;

pub use error::{BusError, Result};
pub use memory::{MemoryBus, RpcOutcome};
pub use queue::{Delivery, JobQueue, Subscription, job_queue_name};
pub use rpc::{DEFAULT_RPC_WAIT, ReplyError, RpcChannel, RpcPublisher, decode_reply};
