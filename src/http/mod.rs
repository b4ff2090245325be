//! HTTP + websocket API
//!
//! This module exposes the streaming endpoint and a few read-only routes:
//! - GET /ws/video-analysis/ (alias /ws/video/) - Websocket frame stream
//! - GET /health, /api/health/ - Health check
//! - GET /api/websocket-info/ - Message format description
//! - GET /api/sessions - Active session statistics
//! - GET /api/sessions/:session_id - One session's statistics

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
