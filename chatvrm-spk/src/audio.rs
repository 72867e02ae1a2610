//! Decoding of the base64 audio payloads Koemotion returns

use crate::error::SpeechError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;

/// Decoded audio plus its declared media type
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub mime_type: String,
    pub data: Bytes,
}

impl AudioClip {
    /// File extension matching the media type
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            _ => "mp3",
        }
    }
}

/// Decode either a `data:<mime>;base64,<payload>` URL or bare base64.
/// Bare payloads are assumed to be MP3.
pub fn decode_audio(audio: &str) -> Result<AudioClip, SpeechError> {
    let (mime_type, payload) = match audio.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| SpeechError::Decode("Data URL has no payload".to_string()))?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| SpeechError::Decode("Data URL is not base64 encoded".to_string()))?;
            (if mime.is_empty() { "audio/mpeg" } else { mime }, payload)
        }
        None => ("audio/mpeg", audio),
    };

    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| SpeechError::Decode(e.to_string()))?;

    Ok(AudioClip {
        mime_type: mime_type.to_string(),
        data: Bytes::from(data),
    })
}
