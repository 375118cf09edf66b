//! Error types for the broadcast hub

use thiserror::Error;

/// Result type alias using the hub's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while framing or delivering socket messages.
///
/// None of these escape the hub's broadcast entry points; they are logged
/// and turned into "connection gone" or "event skipped".
#[derive(Error, Debug)]
pub enum Error {
    /// A payload could not be encoded as JSON
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The connection's outbound queue is full
    #[error("Connection {0} is not keeping up")]
    Backpressure(String),

    /// The connection's receiving side has gone away
    #[error("Connection {0} is closed")]
    Closed(String),
}
