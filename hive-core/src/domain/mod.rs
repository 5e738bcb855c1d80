//! Core domain types
//!
//! This module contains the domain structures shared across the Hive
//! framework runtime. These represent the fundamental business entities:
//! jobs the frameworks schedule, workers the manager reports, tasks the
//! frameworks launch, and the authenticated API caller.

pub mod job;
pub mod task;
pub mod user;
pub mod worker;
