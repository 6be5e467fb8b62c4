use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recommender: RecommenderConfig,
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// Base URL of the external recommendation backend
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// Base URL of the speech-to-text provider
    pub base_url: String,
    /// Provider API key (empty means unconfigured; requests fail fast)
    pub api_key: String,
    pub model: String,
    pub language: String,
    /// Reject uploads larger than this before any network call
    pub max_upload_bytes: usize,
    /// Total attempts for transient failures (connect/timeout/5xx)
    pub max_attempts: u32,
    /// First retry delay; doubles on each subsequent retry
    pub initial_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from an optional file, then environment
    /// overrides (`REEL_CHAT_SERVICE__HTTP__PORT=...`), on top of defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "reel-chat")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 3000_i64)?
            .set_default("recommender.base_url", "http://localhost:5000")?
            .set_default("recommender.request_timeout_secs", 30_i64)?
            .set_default("transcription.base_url", "https://api.openai.com/v1")?
            .set_default("transcription.api_key", "")?
            .set_default("transcription.model", "whisper-1")?
            .set_default("transcription.language", "en")?
            .set_default("transcription.max_upload_bytes", 25_i64 * 1024 * 1024)?
            .set_default("transcription.max_attempts", 3_i64)?
            .set_default("transcription.initial_backoff_ms", 1000_i64)?
            .set_default("transcription.request_timeout_secs", 30_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("REEL_CHAT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
