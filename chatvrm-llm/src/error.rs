use chatvrm_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Invalid API Key for Gemini")]
    MissingApiKey,

    #[error("No messages to send")]
    EmptyConversation,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Something went wrong with Gemini API")]
    Gemini,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LLMError>;

impl From<LLMError> for CoreError {
    fn from(err: LLMError) -> Self {
        CoreError::Chat(err.to_string())
    }
}
