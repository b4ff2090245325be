//! Streaming session core
//!
//! This module provides the per-connection `SessionController` that manages:
//! - Frame admission by sampling interval
//! - At most one in-flight inference per session, with an explicit busy policy
//! - Timeouts and throttle backoff around the inference call
//! - Acknowledgment of every inbound message
//! - Session statistics and the process-wide `SessionRegistry`

mod config;
mod error;
mod frame;
mod messages;
mod registry;
mod session;
mod stats;

pub use config::{BusyPolicy, SessionConfig};
pub use error::{SessionError, ValidationError};
pub use frame::{Frame, Inbound};
pub use messages::{parse_control, ControlMessage, ServerMessage, SkipReason};
pub use registry::{RegisteredSession, SessionRegistry};
pub use session::SessionController;
pub use stats::{SessionState, SessionStats};
