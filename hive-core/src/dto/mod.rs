//! Payloads exchanged over the message bus
//!
//! This module contains the wire types the framework runtime exchanges with
//! the manager (RPC requests/replies) and with itself (job queue messages).
//! They are lightweight serde structs optimized for JSON transfer.

pub mod queue;
pub mod rpc;
