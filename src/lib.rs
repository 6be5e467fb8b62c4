pub mod config;
pub mod error;
pub mod http;
pub mod recommend;
pub mod session;
pub mod transcribe;

pub use config::Config;
pub use error::ChatError;
pub use http::{create_router, AppState};
pub use recommend::{HttpRecommender, NewChatReply, RecommendReply, Recommender, WireTurn};
pub use session::{ConversationTracker, TrackerState, Turn};
pub use transcribe::{
    CaptureGuard, CaptureSlot, SegmentKind, SpeechSegment, StreamingTranscriber,
    TranscriptionClient,
};
