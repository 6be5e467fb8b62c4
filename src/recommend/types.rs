use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One prior turn as serialized to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTurn {
    pub text: String,
    pub is_user: bool,
    /// RFC3339 timestamp
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /recommend` on the backend wire.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendRequest {
    pub text: String,
    pub session_id: String,
    pub conversation_history: Vec<WireTurn>,
}

/// Backend reply for one recommendation round.
///
/// The reply text, count and both conversation flags are required; a
/// payload missing any of them fails the parse and is treated as
/// `BackendUnavailable` by the client. The recommendation fields and
/// preferences are genuinely absent on clarification rounds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendReply {
    #[serde(default)]
    pub single_recommendation: Option<String>,

    /// Comma-joined list of movie titles
    #[serde(default)]
    pub ten_recommendations: Option<String>,

    pub conversation_count: u32,

    pub ai_response: String,

    pub is_asking_question: bool,

    pub conversation_complete: bool,

    #[serde(default)]
    pub user_preferences: HashMap<String, String>,
}

/// Backend reply for `POST /new-chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewChatReply {
    pub session_id: String,
    pub message: String,
}
