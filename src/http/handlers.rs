use super::state::AppState;
use crate::session::SessionStats;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub inference_ready: bool,
    pub active_sessions: usize,
    pub endpoints: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health, GET /api/health/
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: state.service_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            inference_ready: state.inference.is_ready(),
            active_sessions: state.sessions.len().await,
            endpoints: json!({
                "websocket": "ws://<server>/ws/video-analysis/",
                "health": "/api/health/",
            }),
        }),
    )
}

/// GET /api/websocket-info/
/// Describe the websocket endpoint and its message formats
pub async fn websocket_info() -> impl IntoResponse {
    Json(json!({
        "websocket_endpoint": "ws://<server>/ws/video-analysis/",
        "protocol": "websocket",
        "features": [
            "real-time video frame analysis",
            "drowsiness detection",
            "configurable analysis interval",
            "JSON response format"
        ],
        "message_format": {
            "send": {
                "binary": "JPEG encoded video frame bytes",
                "text": { "type": "configure", "interval": "positive integer" }
            },
            "receive": {
                "connection_established": { "type": "connection_established", "message": "string", "status": "ready" },
                "connection_error": { "type": "connection_error", "message": "string", "status": "error" },
                "configuration_acknowledged": { "type": "configuration_acknowledged", "interval": "integer" },
                "frame_received": { "type": "frame_received", "frame_number": "integer", "analyzed": false },
                "processing": { "type": "processing", "frame_number": "integer", "message": "string" },
                "analysis_result": {
                    "type": "analysis_result",
                    "frame_number": "integer",
                    "data": {
                        "drowsiness_level": "awake | mildly_drowsy | moderately_drowsy | highly_drowsy | unknown",
                        "confidence": "float (0.0 to 1.0)",
                        "observations": "list",
                        "recommended_action": "string"
                    }
                },
                "analysis_error": { "type": "analysis_error", "frame_number": "integer", "error": "string" },
                "error": { "type": "error", "message": "string" }
            }
        }
    }))
}

/// GET /api/sessions
/// List statistics for all active sessions
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<SessionStats> = state.sessions.list().await;
    (StatusCode::OK, Json(sessions))
}

/// GET /api/sessions/:session_id
/// Get statistics for one session
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.sessions.get(&session_id).await {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// DELETE /api/sessions/:session_id
/// Cancel a live session; it unregisters itself once its loop has ended
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    if state.sessions.close(&session_id).await {
        info!("Closing session on request: {}", session_id);
        (
            StatusCode::ACCEPTED,
            Json(CloseSessionResponse {
                session_id,
                status: "closing".to_string(),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Session {} not found", session_id),
            }),
        )
            .into_response()
    }
}
