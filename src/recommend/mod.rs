//! Client for the external recommendation backend
//!
//! The backend is an opaque collaborator reached over HTTP:
//! - POST /new-chat   - create a session, returns `{session_id, message}`
//! - POST /recommend  - one conversational round-trip
//!
//! Field names are snake_case on this wire; the internal API surface is
//! camelCase. Translation happens in `types`.

mod client;
mod types;

pub use client::{HttpRecommender, Recommender};
pub use types::{NewChatReply, RecommendReply, RecommendRequest, WireTurn};
