use super::error::ValidationError;
use crate::analysis::AnalysisResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message sent from the server to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    ConnectionEstablished {
        message: String,
        status: String,
    },
    ConnectionError {
        message: String,
        status: String,
    },
    ConfigurationAcknowledged {
        interval: u32,
    },
    FrameReceived {
        frame_number: u64,
        analyzed: bool,
        /// Omitted for ordinary sampling skips
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<SkipReason>,
    },
    Processing {
        frame_number: u64,
        message: String,
    },
    #[serde(rename = "analysis_result")]
    Analysis {
        frame_number: u64,
        data: AnalysisResult,
    },
    AnalysisError {
        frame_number: u64,
        error: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn connection_established() -> Self {
        ServerMessage::ConnectionEstablished {
            message: "Connected to video analysis service".to_string(),
            status: "ready".to_string(),
        }
    }

    pub fn connection_error(reason: impl std::fmt::Display) -> Self {
        ServerMessage::ConnectionError {
            message: reason.to_string(),
            status: "error".to_string(),
        }
    }

    pub fn skipped(frame_number: u64, reason: Option<SkipReason>) -> Self {
        ServerMessage::FrameReceived {
            frame_number,
            analyzed: false,
            reason,
        }
    }

    pub fn processing(frame_number: u64) -> Self {
        ServerMessage::Processing {
            frame_number,
            message: "Analyzing frame...".to_string(),
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        ServerMessage::Error {
            message: message.to_string(),
        }
    }

    /// Frame number this message refers to, if any
    pub fn frame_number(&self) -> Option<u64> {
        match self {
            ServerMessage::FrameReceived { frame_number, .. }
            | ServerMessage::Processing { frame_number, .. }
            | ServerMessage::Analysis { frame_number, .. }
            | ServerMessage::AnalysisError { frame_number, .. } => Some(*frame_number),
            _ => None,
        }
    }
}

/// Why a frame was acknowledged without being analyzed, beyond sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Another inference was in flight
    Busy,
    /// Replaced as the pending frame by a newer one
    Superseded,
    /// Sampling paused after repeated rate limiting
    Throttled,
}

/// Control message sent by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Configure { interval: u32 },
}

/// Parse and validate a client text message
pub fn parse_control(text: &str) -> Result<ControlMessage, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ValidationError::InvalidJson)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingType)?;

    match kind {
        "configure" => {
            let interval = match value.get("interval") {
                None => return Err(ValidationError::InvalidInterval("missing".to_string())),
                Some(raw) => raw
                    .as_u64()
                    .filter(|n| *n >= 1)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| ValidationError::InvalidInterval(raw.to_string()))?,
            };
            Ok(ControlMessage::Configure { interval })
        }
        other => Err(ValidationError::UnsupportedType(other.to_string())),
    }
}
