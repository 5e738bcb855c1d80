//! Hive Core
//!
//! Core types and abstractions for the Hive cluster framework system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, Worker, Task, ...)
//! - DTOs: payloads exchanged with the manager over the bus

pub mod domain;
pub mod dto;
