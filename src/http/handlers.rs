use super::state::AppState;
use crate::error::ChatError;
use crate::session::ConversationTracker;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatResponse {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub text: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub input: String,
    pub session_id: String,
    pub single_recommendation: Option<String>,
    pub ten_recommendations: Option<String>,
    pub conversation_count: u32,
    pub ai_response: String,
    pub is_asking_question: bool,
    pub conversation_complete: bool,
    pub user_preferences: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a chat error onto its HTTP rendering.
fn error_response(err: ChatError) -> axum::response::Response {
    let status = match &err {
        ChatError::Validation(_) => StatusCode::BAD_REQUEST,
        ChatError::TransientProvider(_) => StatusCode::SERVICE_UNAVAILABLE,
        ChatError::FatalProvider(_) => StatusCode::BAD_GATEWAY,
        ChatError::BackendUnavailable => StatusCode::BAD_GATEWAY,
        ChatError::Busy => StatusCode::CONFLICT,
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        // The session was reset while this round was in flight; the stale
        // payload itself was already discarded by the tracker
        ChatError::StaleResponse => StatusCode::CONFLICT,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /transcribe
/// Upload one finished recording, get its transcription back
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    // Pull the audio field out of the form
    let mut audio: Option<(Vec<u8>, String)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("audio") => {
                let mime = field
                    .content_type()
                    .unwrap_or("audio/webm")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => audio = Some((bytes.to_vec(), mime)),
                    Err(e) => {
                        warn!("Failed to read audio field: {}", e);
                        return error_response(ChatError::validation("Malformed audio upload"));
                    }
                }
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return error_response(ChatError::validation("Malformed multipart body"));
            }
        }
    }

    let Some((bytes, mime)) = audio else {
        return error_response(ChatError::validation("No audio file provided"));
    };

    info!("Transcription upload received ({} bytes, {})", bytes.len(), mime);

    match state.transcriber.transcribe(bytes, &mime).await {
        Ok(text) => (StatusCode::OK, Json(TranscribeResponse { text })).into_response(),
        Err(e) => {
            error!("Transcription failed: {}", e);
            error_response(e)
        }
    }
}

/// POST /new-chat
/// Start a new conversation session
pub async fn new_chat(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = match ConversationTracker::start(Arc::clone(&state.recommender)).await {
        Ok(t) => Arc::new(t),
        Err(e) => {
            error!("Failed to start session: {}", e);
            return error_response(e);
        }
    };

    let session_id = tracker.session_id().await;
    let greeting = tracker
        .history()
        .await
        .first()
        .map(|turn| turn.text.clone())
        .unwrap_or_default();

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), tracker);
    }

    info!("New chat session registered: {}", session_id);

    (
        StatusCode::OK,
        Json(NewChatResponse {
            session_id,
            message: greeting,
        }),
    )
        .into_response()
}

/// POST /movie-recommendation
/// Run one recommendation round-trip for an existing session
pub async fn movie_recommendation(
    State(state): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> impl IntoResponse {
    let tracker = {
        let sessions = state.sessions.read().await;
        sessions.get(&req.session_id).cloned()
    };

    let Some(tracker) = tracker else {
        warn!("Recommendation for unknown session {}", req.session_id);
        return error_response(ChatError::SessionNotFound(req.session_id));
    };

    match tracker.submit(&req.text).await {
        Ok(turn) => {
            let response = RecommendationResponse {
                input: req.text,
                session_id: req.session_id,
                single_recommendation: turn.single_recommendation,
                ten_recommendations: turn.ten_recommendations,
                conversation_count: turn.conversation_count.unwrap_or_default(),
                ai_response: turn.ai_response.unwrap_or(turn.text),
                is_asking_question: turn.is_asking_question.unwrap_or(false),
                conversation_complete: turn.conversation_complete.unwrap_or(false),
                user_preferences: tracker.preferences().await,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Recommendation round failed: {}", e);
            error_response(e)
        }
    }
}

/// GET /sessions/:session_id/history
/// Ordered conversation history for one session
pub async fn get_session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(tracker) => (StatusCode::OK, Json(tracker.history().await)).into_response(),
        None => error_response(ChatError::SessionNotFound(session_id)),
    }
}

/// POST /sessions/:session_id/reset
/// Discard a conversation and replace it with a fresh session
pub async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let tracker = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    let Some(tracker) = tracker else {
        return error_response(ChatError::SessionNotFound(session_id));
    };

    match tracker.reset().await {
        Ok((new_id, message)) => {
            // Re-key the registry: the old id is gone for good
            {
                let mut sessions = state.sessions.write().await;
                sessions.remove(&session_id);
                sessions.insert(new_id.clone(), tracker);
            }

            info!("Session {} reset -> {}", session_id, new_id);

            (
                StatusCode::OK,
                Json(NewChatResponse {
                    session_id: new_id,
                    message,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to reset session {}: {}", session_id, e);
            error_response(e)
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.sessions.read().await.len();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            active_sessions: active,
        }),
    )
}
