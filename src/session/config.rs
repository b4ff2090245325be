use crate::config::SessionSettings;
use serde::Deserialize;
use std::time::Duration;

/// What to do with a sampled frame that arrives while an inference is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Acknowledge the frame as not analyzed
    Drop,
    /// Park it as the single pending frame; a newer sampled frame supersedes it
    Queue,
}

/// Configuration for a streaming session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-6f1c...")
    pub session_id: String,

    /// Analyze every Nth frame until the client reconfigures
    pub sampling_interval: u32,

    /// Upper bound on a single inference call
    pub inference_timeout: Duration,

    pub busy_policy: BusyPolicy,

    /// First backoff after a throttled call; doubles per consecutive throttle
    pub throttle_backoff_base: Duration,

    pub throttle_backoff_max: Duration,
}

impl SessionConfig {
    pub fn from_settings(session_id: String, settings: &SessionSettings) -> Self {
        Self {
            session_id,
            sampling_interval: settings.default_interval.max(1),
            inference_timeout: Duration::from_secs(settings.inference_timeout_secs),
            busy_policy: settings.busy_policy,
            throttle_backoff_base: Duration::from_millis(settings.throttle_backoff_base_ms),
            throttle_backoff_max: Duration::from_millis(settings.throttle_backoff_max_ms),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(
            format!("session-{}", uuid::Uuid::new_v4()),
            &SessionSettings::default(),
        )
    }
}
