use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Headroom for multipart boundaries and form fields on top of the raw
/// audio payload.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    // The extractor's default body cap (2 MB) would reject uploads before
    // the local size check ever sees them; size it from the configured cap
    let body_limit = state.transcriber.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Speech-to-text
        .route("/transcribe", post(handlers::transcribe))
        // Conversation lifecycle
        .route("/new-chat", post(handlers::new_chat))
        .route(
            "/movie-recommendation",
            post(handlers::movie_recommendation),
        )
        // Session queries and reset
        .route(
            "/sessions/:session_id/history",
            get(handlers::get_session_history),
        )
        .route(
            "/sessions/:session_id/reset",
            post(handlers::reset_session),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        // Browser front-end is same-origin in production, permissive in dev
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
