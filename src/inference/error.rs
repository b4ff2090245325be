use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by an inference call
///
/// Clients never retry internally; the session decides what to do next.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// Network failure, unexpected API response, or timeout
    #[error("Transport error: {0}")]
    Transport(String),

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote rate limit hit
    #[error("Rate limited by inference API")]
    Throttled {
        /// Server-suggested wait, if it sent one
        retry_after: Option<Duration>,
    },

    /// Frame bytes could not be decoded as an image
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// The inference task itself failed (panicked)
    #[error("Internal inference failure: {0}")]
    Internal(String),
}

impl InferenceError {
    pub fn timeout(after: Duration) -> Self {
        InferenceError::Transport(format!(
            "inference timed out after {:.1}s",
            after.as_secs_f64()
        ))
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        InferenceError::Transport(err.to_string())
    }
}
