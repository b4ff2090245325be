use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/health/", get(handlers::health_check))
        // Protocol description
        .route("/api/websocket-info/", get(handlers::websocket_info))
        // Session queries
        .route("/api/sessions", get(handlers::list_sessions))
        .route(
            "/api/sessions/:session_id",
            get(handlers::get_session).delete(handlers::close_session),
        )
        // Frame streaming
        .route("/ws/video-analysis/", get(ws::video_analysis))
        .route("/ws/video/", get(ws::video_analysis))
        // Request logging, and CORS for browser clients
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
