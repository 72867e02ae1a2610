//! chatvrm-core: shared vocabulary for the chatvrm avatar pipeline
//!
//! Emotion tags, voice styles, VRM expression presets, the workspace error
//! type and the layered configuration every other crate reads.

pub mod types;
pub mod error;
pub mod config;

pub use error::{Error, Result};
pub use types::{EmotionTag, ExpressionPreset, TalkStyle, VoiceParams};
pub use config::{
    ChatVrmConfig, ConfigError, ExpressionConfig, GeminiConfig, KoeiromapConfig, RetryConfig,
    SegmenterConfig, ServerConfig,
};
