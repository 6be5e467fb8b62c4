//! Error taxonomy shared across the transcription and recommendation paths.
//!
//! Every user-facing failure falls into one of these categories; handlers
//! map them to HTTP statuses at the boundary and the session tracker never
//! panics or wedges on any of them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or empty required input. No network call was attempted.
    #[error("{0}")]
    Validation(String),

    /// Network/timeout failure talking to the transcription provider.
    /// Retried with backoff before being surfaced.
    #[error("transcription provider unavailable: {0}")]
    TransientProvider(String),

    /// Non-retryable provider failure (bad credentials, quota, unsupported
    /// media). Surfaced immediately.
    #[error("{0}")]
    FatalProvider(String),

    /// The recommendation backend failed or returned a malformed payload.
    #[error("recommendation unavailable")]
    BackendUnavailable,

    /// A recommendation round-trip is already in flight for this session.
    #[error("a recommendation request is already in progress")]
    Busy,

    /// The referenced session id is unknown to this service.
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// A response arrived for a superseded session; discarded silently.
    #[error("response belongs to a superseded session")]
    StaleResponse,
}

impl ChatError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ChatError::Validation(msg.into())
    }
}
