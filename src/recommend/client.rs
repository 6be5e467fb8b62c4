use super::types::{NewChatReply, RecommendReply, RecommendRequest, WireTurn};
use crate::config::RecommenderConfig;
use crate::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info, warn};

/// Seam for the recommendation backend, so the session tracker can be
/// exercised against a scripted fake in tests.
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Start a new conversation; returns the session id and greeting.
    async fn new_chat(&self) -> Result<NewChatReply, ChatError>;

    /// One recommendation round-trip. `history` holds all prior turns,
    /// oldest first, not including `text` itself.
    async fn recommend(
        &self,
        text: &str,
        session_id: &str,
        history: &[WireTurn],
    ) -> Result<RecommendReply, ChatError>;
}

/// HTTP client for the external recommendation backend.
///
/// This client never retries: the backend round-trip is serialized by the
/// session tracker, and any failure becomes one AI-authored error turn.
pub struct HttpRecommender {
    client: Client,
    base_url: String,
}

impl HttpRecommender {
    pub fn new(config: &RecommenderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Recommender for HttpRecommender {
    async fn new_chat(&self) -> Result<NewChatReply, ChatError> {
        info!("Requesting new chat session from backend");

        let response = self
            .client
            .post(self.url("/new-chat"))
            .send()
            .await
            .map_err(|e| {
                error!("new-chat request failed: {}", e);
                ChatError::BackendUnavailable
            })?;

        if !response.status().is_success() {
            error!("new-chat returned status {}", response.status());
            return Err(ChatError::BackendUnavailable);
        }

        let reply: NewChatReply = response.json().await.map_err(|e| {
            warn!("new-chat payload failed to parse: {}", e);
            ChatError::BackendUnavailable
        })?;

        info!("Backend created session {}", reply.session_id);
        Ok(reply)
    }

    async fn recommend(
        &self,
        text: &str,
        session_id: &str,
        history: &[WireTurn],
    ) -> Result<RecommendReply, ChatError> {
        // Fail fast before any network call
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::validation("No text provided"));
        }
        if session_id.is_empty() {
            return Err(ChatError::validation("No session id provided"));
        }

        let body = RecommendRequest {
            text: trimmed.to_string(),
            session_id: session_id.to_string(),
            conversation_history: history.to_vec(),
        };

        info!(
            "Requesting recommendation (session={}, history_len={})",
            session_id,
            history.len()
        );

        let response = self
            .client
            .post(self.url("/recommend"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("recommend request failed: {}", e);
                ChatError::BackendUnavailable
            })?;

        if !response.status().is_success() {
            error!("recommend returned status {}", response.status());
            return Err(ChatError::BackendUnavailable);
        }

        // A malformed payload is indistinguishable from an unavailable
        // backend as far as the caller is concerned
        let reply: RecommendReply = response.json().await.map_err(|e| {
            warn!("recommend payload failed to parse: {}", e);
            ChatError::BackendUnavailable
        })?;

        Ok(reply)
    }
}
