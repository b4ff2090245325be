use thiserror::Error;

/// Rejected client control message
///
/// Reported to the client as an `error` message; the session continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Message is missing a string \"type\" field")]
    MissingType,

    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),

    #[error("Invalid interval: {0} (must be a positive integer)")]
    InvalidInterval(String),
}

/// Conditions that end a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// No inference client could be acquired at connect time
    #[error("Failed to initialize analysis service: {0}")]
    Unavailable(String),

    /// The client side of the connection is gone
    #[error("Client disconnected")]
    Disconnected,

    /// The session's cancellation token fired (shutdown or explicit close)
    #[error("Session cancelled")]
    Cancelled,
}
