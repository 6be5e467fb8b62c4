use super::turn::{TrackerState, Turn};
use crate::error::ChatError;
use crate::recommend::{Recommender, WireTurn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// All mutable conversation state lives behind one lock, so flags can
/// never drift apart.
struct TrackerInner {
    session_id: String,
    /// Bumped on every reset; a round-trip started under an older epoch
    /// must not touch history when it completes
    epoch: u64,
    state: TrackerState,
    in_flight: bool,
    history: Vec<Turn>,
    preferences: HashMap<String, String>,
    /// Highest conversation_count seen; replies never lower it
    conversation_count: u32,
}

/// The multi-turn session state machine.
///
/// One tracker per conversation. Submissions are serialized: a second
/// submission while a round-trip is outstanding is rejected as busy rather
/// than queued.
pub struct ConversationTracker {
    recommender: Arc<dyn Recommender>,
    inner: Mutex<TrackerInner>,
}

impl ConversationTracker {
    /// Create a session via the backend and seed the history with its
    /// greeting as the first AI turn.
    pub async fn start(recommender: Arc<dyn Recommender>) -> Result<Self, ChatError> {
        let reply = recommender.new_chat().await?;

        info!("Session {} started", reply.session_id);

        Ok(Self {
            recommender,
            inner: Mutex::new(TrackerInner {
                session_id: reply.session_id,
                epoch: 0,
                state: TrackerState::Active,
                in_flight: false,
                history: vec![Turn::assistant_message(reply.message)],
                preferences: HashMap::new(),
                conversation_count: 0,
            }),
        })
    }

    /// Submit one user utterance and run a full recommendation round-trip.
    ///
    /// On success the appended AI turn is returned; history gained exactly
    /// one user turn and one AI turn, in that order. On a backend failure
    /// the AI turn carries the error text and the session stays usable.
    /// Validation and busy rejections happen before anything is appended.
    pub async fn submit(&self, text: &str) -> Result<Turn, ChatError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::validation("No text provided"));
        }

        // Phase 1: claim the in-flight slot and append the user turn
        let (session_id, epoch, wire_history) = {
            let mut inner = self.inner.lock().await;

            if inner.in_flight {
                warn!(
                    "Session {}: submission rejected, round-trip in flight",
                    inner.session_id
                );
                return Err(ChatError::Busy);
            }

            // History snapshot excludes the turn being submitted; the
            // backend receives it as `text`
            let wire_history: Vec<WireTurn> = inner.history.iter().map(Turn::to_wire).collect();

            inner.history.push(Turn::user(trimmed));
            inner.in_flight = true;
            inner.state = TrackerState::AwaitingRecommendation;

            (inner.session_id.clone(), inner.epoch, wire_history)
        };

        // Phase 2: round-trip without holding the lock
        let outcome = self
            .recommender
            .recommend(trimmed, &session_id, &wire_history)
            .await;

        // Phase 3: apply, unless a reset superseded this round
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            warn!(
                "Discarding stale recommendation response for superseded session {}",
                session_id
            );
            return Err(ChatError::StaleResponse);
        }

        inner.in_flight = false;

        match outcome {
            Ok(reply) => {
                inner.conversation_count = inner.conversation_count.max(reply.conversation_count);
                inner
                    .preferences
                    .extend(reply.user_preferences.clone());

                // conversation_complete wins when both flags are set
                inner.state = if reply.conversation_complete {
                    TrackerState::Complete
                } else if reply.is_asking_question {
                    TrackerState::AwaitingClarification
                } else {
                    TrackerState::Active
                };

                let turn = Turn::assistant(&reply, inner.conversation_count);
                inner.history.push(turn.clone());

                info!(
                    "Session {}: round applied (count={}, state={:?})",
                    session_id, inner.conversation_count, inner.state
                );

                Ok(turn)
            }
            Err(err) => {
                // The error still becomes one AI-authored turn so the
                // conversation shows what happened
                inner
                    .history
                    .push(Turn::assistant_message(err.to_string()));
                inner.state = TrackerState::Active;

                warn!("Session {}: round failed: {}", session_id, err);

                Err(err)
            }
        }
    }

    /// Discard the current conversation and start a fresh one.
    ///
    /// Yields a new session id and an empty history (re-seeded with the
    /// new greeting). Any in-flight round-trip is orphaned: its eventual
    /// completion sees a bumped epoch and is dropped.
    pub async fn reset(&self) -> Result<(String, String), ChatError> {
        let reply = self.recommender.new_chat().await?;

        let mut inner = self.inner.lock().await;
        let old_id = std::mem::replace(&mut inner.session_id, reply.session_id.clone());

        inner.epoch += 1;
        inner.state = TrackerState::Active;
        inner.in_flight = false;
        inner.history = vec![Turn::assistant_message(reply.message.clone())];
        inner.preferences.clear();
        inner.conversation_count = 0;

        info!("Session {} reset, replaced by {}", old_id, inner.session_id);

        Ok((reply.session_id, reply.message))
    }

    pub async fn session_id(&self) -> String {
        self.inner.lock().await.session_id.clone()
    }

    pub async fn state(&self) -> TrackerState {
        self.inner.lock().await.state
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.inner.lock().await.history.clone()
    }

    pub async fn preferences(&self) -> HashMap<String, String> {
        self.inner.lock().await.preferences.clone()
    }

    pub async fn conversation_count(&self) -> u32 {
        self.inner.lock().await.conversation_count
    }
}
