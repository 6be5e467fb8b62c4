//! Conversational session tracking
//!
//! This module owns the multi-turn state machine behind the chat surface:
//! - Session identity (opaque id issued by the backend) and its lifecycle
//! - Ordered conversation history (user and AI turns)
//! - The in-flight/clarification/complete flags that drive UI transitions
//!
//! At most one recommendation round-trip is in flight per session; a
//! submission while one is outstanding is rejected as busy, and a response
//! that arrives after a reset is discarded by an epoch guard.

mod tracker;
mod turn;

pub use tracker::ConversationTracker;
pub use turn::{TrackerState, Turn};
