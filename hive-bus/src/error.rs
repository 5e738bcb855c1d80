//! Error types for bus operations

use thiserror::Error;

/// Result type alias for bus operations
pub type Result<T> = std::result::Result<T, BusError>;

/// Errors raised by the bus transport.
///
/// Transport failures are recoverable by design: the dispatch loop and the
/// consumer log them and skip the current operation rather than dying.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus could not be reached at all
    #[error("bus unreachable: {0}")]
    Unreachable(String),

    /// A channel-level operation was rejected
    #[error("channel error: {0}")]
    Channel(String),

    /// Passive declare against a queue that does not exist
    #[error("unknown queue: {0}")]
    UnknownQueue(String),

    /// Payload could not be encoded for transfer
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
