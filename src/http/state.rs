use crate::recommend::Recommender;
use crate::session::ConversationTracker;
use crate::transcribe::TranscriptionClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live conversations (session_id -> tracker)
    pub sessions: Arc<RwLock<HashMap<String, Arc<ConversationTracker>>>>,

    /// Recommendation backend client (trait object so tests can script it)
    pub recommender: Arc<dyn Recommender>,

    /// Batch speech-to-text client
    pub transcriber: Arc<TranscriptionClient>,
}

impl AppState {
    pub fn new(recommender: Arc<dyn Recommender>, transcriber: Arc<TranscriptionClient>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            recommender,
            transcriber,
        }
    }
}
