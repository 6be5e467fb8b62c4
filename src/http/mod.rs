//! HTTP API exposed to the chat front-end (same-origin)
//!
//! - POST /transcribe                - multipart audio upload -> `{text}`
//! - POST /new-chat                  - start a conversation -> `{sessionId, message}`
//! - POST /movie-recommendation     - one recommendation round-trip
//! - GET  /sessions/:id/history      - ordered turn list for a session
//! - POST /sessions/:id/reset        - discard and replace a session
//! - GET  /health                    - health check
//!
//! This surface is camelCase; translation to the backend's snake_case wire
//! happens in the `recommend` module.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
