use super::media::{extension_for_mime, validate_upload};
use crate::config::TranscriptionConfig;
use crate::error::ChatError;
use reqwest::{multipart, Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct TranscriptionReply {
    text: String,
}

/// One attempt's failure, split by whether another attempt makes sense.
#[derive(Debug)]
enum AttemptError {
    /// Network/timeout/5xx; worth retrying with backoff
    Transient(String),
    /// Credentials, quota, unsupported media; retrying cannot help
    Fatal(ChatError),
}

/// Batch transcription client for the speech-to-text provider.
///
/// Uploads one complete audio buffer per call. Transient failures are
/// retried up to `max_attempts` with exponential backoff (1s, 2s, ...);
/// non-retryable provider errors surface immediately.
pub struct TranscriptionClient {
    client: Client,
    config: TranscriptionConfig,
}

impl TranscriptionClient {
    pub fn new(config: TranscriptionConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// The configured upload cap; the HTTP layer sizes its request-body
    /// limit from this.
    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    /// Transcribe one finished recording. `mime` is the declared container
    /// type from the upload; it selects the file extension sent upstream.
    pub async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> Result<String, ChatError> {
        validate_upload(audio.len(), self.config.max_upload_bytes)?;

        if self.config.api_key.is_empty() {
            return Err(ChatError::FatalProvider(
                "Transcription API key not configured".to_string(),
            ));
        }

        let file_name = format!("audio.{}", extension_for_mime(mime));
        info!(
            "Transcribing upload ({} bytes, {} -> {})",
            audio.len(),
            mime,
            file_name
        );

        let text = with_retries(
            self.config.max_attempts,
            Duration::from_millis(self.config.initial_backoff_ms),
            |attempt| self.attempt(attempt, &audio, mime, &file_name),
        )
        .await?;

        info!("Transcription successful ({} chars)", text.len());
        Ok(text)
    }

    async fn attempt(
        &self,
        attempt: u32,
        audio: &[u8],
        mime: &str,
        file_name: &str,
    ) -> Result<String, AttemptError> {
        info!(
            "Transcription attempt {}/{}",
            attempt, self.config.max_attempts
        );

        let part = multipart::Part::bytes(audio.to_vec())
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|_| {
                AttemptError::Fatal(ChatError::FatalProvider(format!(
                    "Unsupported audio format: {}",
                    mime
                )))
            })?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone());

        let response = self
            .client
            .post(format!(
                "{}/audio/transcriptions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let reply: TranscriptionReply = response
                .json()
                .await
                .map_err(|e| AttemptError::Transient(e.to_string()))?;
            return Ok(reply.text);
        }

        Err(classify_status(status))
    }
}

/// Map a provider status onto the retry decision.
fn classify_status(status: StatusCode) -> AttemptError {
    match status {
        StatusCode::UNAUTHORIZED => AttemptError::Fatal(ChatError::FatalProvider(
            "Invalid transcription API key".to_string(),
        )),
        StatusCode::TOO_MANY_REQUESTS => AttemptError::Fatal(ChatError::FatalProvider(
            "Transcription quota exceeded".to_string(),
        )),
        StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            AttemptError::Fatal(ChatError::FatalProvider(
                "Unsupported audio format. Please try recording again.".to_string(),
            ))
        }
        s if s.is_server_error() => AttemptError::Transient(format!("provider returned {}", s)),
        s => AttemptError::Fatal(ChatError::FatalProvider(format!(
            "Transcription failed with status {}",
            s
        ))),
    }
}

/// Run `op` up to `max_attempts` times, sleeping `initial_backoff` doubled
/// after each transient failure. A fatal failure or success ends the loop
/// immediately; exhausting all attempts surfaces the last transient error
/// as fatal.
async fn with_retries<F, Fut>(
    max_attempts: u32,
    initial_backoff: Duration,
    mut op: F,
) -> Result<String, ChatError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<String, AttemptError>>,
{
    let mut backoff = initial_backoff;

    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Ok(text) => return Ok(text),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Transient(msg)) => {
                if attempt == max_attempts {
                    return Err(ChatError::FatalProvider(format!(
                        "Transcription failed after {} attempts: {}",
                        max_attempts, msg
                    )));
                }
                warn!(
                    "Transient transcription failure (attempt {}): {}; retrying in {:?}",
                    attempt, msg, backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }
    }

    // Only reachable with max_attempts == 0
    Err(ChatError::FatalProvider(
        "Transcription disabled: no attempts configured".to_string(),
    ))
}
