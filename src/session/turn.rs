use crate::recommend::{RecommendReply, WireTurn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerState {
    /// No session yet
    Idle,
    /// Session exists, awaiting user input
    Active,
    /// A recommendation round-trip is outstanding
    AwaitingRecommendation,
    /// The AI asked a follow-up question and awaits the reply
    AwaitingClarification,
    /// The backend delivered its final recommendations
    Complete,
}

/// One message in a conversation, user- or AI-authored.
///
/// The recommendation fields are only ever set on AI turns. Serialized
/// camelCase for the front-end surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub id: uuid::Uuid,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_recommendation: Option<String>,

    /// Comma-joined titles from the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ten_recommendations: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_asking_question: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_complete: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_preferences: Option<HashMap<String, String>>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::bare(text.into(), true)
    }

    /// AI greeting or plain message without recommendation payload.
    pub fn assistant_message(text: impl Into<String>) -> Self {
        Self::bare(text.into(), false)
    }

    /// AI turn carrying one round's recommendation payload.
    pub fn assistant(reply: &RecommendReply, conversation_count: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            text: reply.ai_response.clone(),
            is_user: false,
            timestamp: Utc::now(),
            single_recommendation: reply.single_recommendation.clone(),
            ten_recommendations: reply.ten_recommendations.clone(),
            conversation_count: Some(conversation_count),
            ai_response: Some(reply.ai_response.clone()),
            is_asking_question: Some(reply.is_asking_question),
            conversation_complete: Some(reply.conversation_complete),
            user_preferences: if reply.user_preferences.is_empty() {
                None
            } else {
                Some(reply.user_preferences.clone())
            },
        }
    }

    fn bare(text: String, is_user: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            text,
            is_user,
            timestamp: Utc::now(),
            single_recommendation: None,
            ten_recommendations: None,
            conversation_count: None,
            ai_response: None,
            is_asking_question: None,
            conversation_complete: None,
            user_preferences: None,
        }
    }

    /// Project this turn onto the backend wire format.
    pub fn to_wire(&self) -> WireTurn {
        WireTurn {
            text: self.text.clone(),
            is_user: self.is_user,
            timestamp: self.timestamp,
        }
    }
}
