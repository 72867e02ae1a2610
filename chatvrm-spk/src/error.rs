//! Error types for chatvrm-spk

use chatvrm_core::Error as CoreError;
use thiserror::Error;

/// Voice synthesis errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Koemotion API error: {0}")]
    Api(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("'audio' property not found in Koemotion API response.")]
    MissingAudio,

    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl From<SpeechError> for CoreError {
    fn from(err: SpeechError) -> Self {
        CoreError::Speech(err.to_string())
    }
}
