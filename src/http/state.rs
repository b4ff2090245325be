use crate::config::SessionSettings;
use crate::inference::InferenceHandle;
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Shared application state for HTTP and websocket handlers
#[derive(Clone)]
pub struct AppState {
    /// Active streaming sessions (session_id → session)
    pub sessions: SessionRegistry,

    /// The process-wide inference client, built once at startup
    pub inference: InferenceHandle,

    /// Defaults for new sessions
    pub session_settings: Arc<SessionSettings>,

    /// Service name reported by the health check
    pub service_name: Arc<str>,
}

impl AppState {
    pub fn new(inference: InferenceHandle, session_settings: SessionSettings) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            inference,
            session_settings: Arc::new(session_settings),
            service_name: Arc::from(env!("CARGO_PKG_NAME")),
        }
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Arc::from(name.into());
        self
    }
}
