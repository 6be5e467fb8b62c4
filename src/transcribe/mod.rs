//! Transcription sources
//!
//! Two interchangeable producers of text from audio:
//! - `TranscriptionClient`: batch upload of one finished recording to the
//!   cloud speech-to-text provider, with bounded retries on transient
//!   failures
//! - `StreamingTranscriber`: a live recognizer feed that emits interim and
//!   final segments; only final segments are forwarded downstream
//!
//! Whichever variant is active holds the capture slot exclusively and
//! releases it when dropped.

mod client;
mod media;
mod stream;

pub use client::TranscriptionClient;
pub use media::{extension_for_mime, validate_upload};
pub use stream::{CaptureGuard, CaptureSlot, SegmentKind, SpeechSegment, StreamingTranscriber};
