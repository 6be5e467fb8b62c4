use crate::error::ChatError;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, info};

/// Whether a recognizer segment is still being refined or settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Interim,
    Final,
}

/// One text segment emitted by a live recognizer.
#[derive(Debug, Clone)]
pub struct SpeechSegment {
    pub text: String,
    pub kind: SegmentKind,
}

impl SpeechSegment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SegmentKind::Interim,
        }
    }

    pub fn final_(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SegmentKind::Final,
        }
    }
}

/// The single capture slot shared by both transcription variants.
///
/// Whichever source is active holds the slot; a second acquisition fails
/// as busy instead of waiting, and the slot frees when the guard drops.
#[derive(Clone)]
pub struct CaptureSlot {
    slot: Arc<Semaphore>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn acquire(&self) -> Result<CaptureGuard, ChatError> {
        match Arc::clone(&self.slot).try_acquire_owned() {
            Ok(permit) => {
                debug!("Capture slot acquired");
                Ok(CaptureGuard { _permit: permit })
            }
            Err(TryAcquireError::NoPermits) => Err(ChatError::Busy),
            Err(TryAcquireError::Closed) => Err(ChatError::Busy),
        }
    }
}

impl Default for CaptureSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on the capture slot; released on drop, including on
/// error paths and task teardown.
pub struct CaptureGuard {
    _permit: OwnedSemaphorePermit,
}

/// Streaming transcription source.
///
/// Consumes a live recognizer feed and forwards only final segments.
/// Stops when the feed closes or the receiver is dropped.
pub struct StreamingTranscriber {
    rx: mpsc::Receiver<SpeechSegment>,
    _guard: CaptureGuard,
}

impl StreamingTranscriber {
    /// Attach to a recognizer feed, claiming the capture slot for the
    /// lifetime of this transcriber.
    pub fn attach(slot: &CaptureSlot, rx: mpsc::Receiver<SpeechSegment>) -> Result<Self, ChatError> {
        let guard = slot.acquire()?;
        info!("Streaming transcriber attached");
        Ok(Self { rx, _guard: guard })
    }

    /// Next settled segment, skipping interim refinements. `None` once the
    /// recognizer signals end-of-stream.
    pub async fn next_final(&mut self) -> Option<String> {
        while let Some(segment) = self.rx.recv().await {
            match segment.kind {
                SegmentKind::Interim => {
                    debug!("Skipping interim segment ({} chars)", segment.text.len());
                }
                SegmentKind::Final => return Some(segment.text),
            }
        }
        None
    }
}

/// The transcriber is also a plain stream of settled text segments.
impl Stream for StreamingTranscriber {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(segment)) => match segment.kind {
                    SegmentKind::Interim => continue,
                    SegmentKind::Final => return Poll::Ready(Some(segment.text)),
                },
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
