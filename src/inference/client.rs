use super::error::InferenceError;
use std::sync::Arc;

/// Vision-inference capability trait
///
/// Implementations turn one encoded frame into the model's raw textual reply.
/// They hold no per-session state and must be safe to share across sessions.
///
/// Implementations:
/// - `OpenAiVisionClient`: OpenAI-compatible chat-completions API
/// - test fakes driving the session state machine
#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// Submit one frame and return the raw model output
    ///
    /// May suspend for the full network round trip. Never retries.
    async fn infer(&self, frame: &[u8]) -> Result<String, InferenceError>;

    /// Client name for logging
    fn name(&self) -> &str;
}

/// Process-wide slot for the inference client
///
/// Built once at startup. If construction failed (e.g. missing credentials)
/// the handle keeps the construction error, and every session that tries to
/// acquire a client reports it instead of the whole process failing.
#[derive(Clone)]
pub struct InferenceHandle {
    inner: Result<Arc<dyn InferenceClient>, InferenceError>,
}

impl InferenceHandle {
    pub fn ready(client: Arc<dyn InferenceClient>) -> Self {
        Self { inner: Ok(client) }
    }

    pub fn unavailable(err: InferenceError) -> Self {
        Self { inner: Err(err) }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.is_ok()
    }

    /// Get a shared reference to the client, or the error that kept it from being built
    pub fn acquire(&self) -> Result<Arc<dyn InferenceClient>, InferenceError> {
        match &self.inner {
            Ok(client) => Ok(Arc::clone(client)),
            Err(err) => Err(err.clone()),
        }
    }
}

impl std::fmt::Debug for InferenceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Ok(client) => write!(f, "InferenceHandle::Ready({})", client.name()),
            Err(err) => write!(f, "InferenceHandle::Unavailable({})", err),
        }
    }
}
