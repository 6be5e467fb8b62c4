use crate::error::ChatError;

/// Map a declared MIME type onto the container extension the provider
/// expects. Anything unrecognized falls back to webm, the default browser
/// recording container.
pub fn extension_for_mime(mime: &str) -> &'static str {
    if mime.contains("mp3") || mime.contains("mpeg") {
        "mp3"
    } else if mime.contains("mp4") {
        "mp4"
    } else if mime.contains("wav") {
        "wav"
    } else if mime.contains("ogg") {
        "ogg"
    } else {
        "webm"
    }
}

/// Local upload checks, run before any network call.
pub fn validate_upload(len: usize, max_bytes: usize) -> Result<(), ChatError> {
    if len == 0 {
        return Err(ChatError::validation("No audio file provided"));
    }
    if len > max_bytes {
        return Err(ChatError::validation(format!(
            "Audio file too large. Maximum size is {} MB.",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}
