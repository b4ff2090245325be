use crate::analysis::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Connecting,
    Ready,
    /// An inference call is in flight
    Processing,
    Closed,
}

/// Statistics about a streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: SessionState,

    /// When the client connected
    pub connected_at: DateTime<Utc>,

    /// Current sampling interval (frames between analyses)
    pub sampling_interval: u32,

    /// Binary frames received so far
    pub frames_received: u64,

    /// Frames that produced an `analysis_result`
    pub frames_analyzed: u64,

    /// Frames acknowledged with `analyzed: false`
    pub frames_skipped: u64,

    /// Frames that produced an `analysis_error`
    pub analysis_errors: u64,

    /// Most recent successful analysis, if any
    pub last_result: Option<AnalysisResult>,
}

impl SessionStats {
    pub fn new(session_id: String, sampling_interval: u32) -> Self {
        Self {
            session_id,
            state: SessionState::Connecting,
            connected_at: Utc::now(),
            sampling_interval,
            frames_received: 0,
            frames_analyzed: 0,
            frames_skipped: 0,
            analysis_errors: 0,
            last_result: None,
        }
    }
}
