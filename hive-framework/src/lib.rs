//! Hive Framework
//!
//! The scheduling core of the Hive cluster orchestration system.
//!
//! Architecture:
//! - Configuration: host config plus per-framework descriptor files
//! - Framework: registration state machine, dispatch loop, job consumer
//! - Store: job persistence capability (Postgres or in-memory)
//! - API: per-framework HTTP resources behind the auth interceptor
//! - Host: constructs and supervises one Framework per descriptor
//!
//! Each framework registers with the manager over the bus, periodically
//! discovers unprocessed jobs for its datacenter and publishes them to its
//! own queue, and consumes them back one at a time.

pub mod api;
pub mod config;
pub mod framework;
pub mod frameworks;
pub mod host;
pub mod registry;
pub mod shutdown;
pub mod store;

pub use config::{BaseConfig, ConfigError, FrameworkDescriptor, FrameworkSettings};
pub use framework::{AckPolicy, Framework, FrameworkHandler};
pub use host::FrameworkHost;
pub use registry::FrameworkRegistry;
