//! Error types for the Lockstep core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the Lockstep Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Lockstep operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The group has more members than the tag palette can label.
    /// Raised before any child process is spawned.
    #[error("group size {size} exceeds the {supported} supported rank tags")]
    GroupTooLarge { size: u32, supported: usize },

    /// The external command could not be started.
    #[error("failed to spawn child process: {0}")]
    Spawn(std::io::Error),

    /// A child's output stream is not valid UTF-8.
    #[error("child output is not valid UTF-8: {0}")]
    Decode(std::io::Error),

    /// A collective call did not complete within the configured bound.
    /// Usually means a peer stopped calling `broadcast`.
    #[error("broadcast did not complete within {0:?}")]
    BroadcastTimeout(Duration),

    /// A member left the group while a collective call was in flight.
    #[error("group channel closed: a member left the group")]
    GroupClosed,

    /// Collective protocol misuse (e.g. a non-root member supplying a frame).
    #[error("collective protocol violation: {0}")]
    Protocol(&'static str),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
