//! chatvrm-llm: conversation replies for the avatar
//!
//! Streams Gemini replies piece by piece, backing off on rate limits.

pub mod error;
pub mod gemini;
pub mod message;
pub mod sse;

pub use error::*;
pub use gemini::{collect_reply, ChatProvider, ChatStream, GeminiClient};
pub use message::{Message, MessageRole};
