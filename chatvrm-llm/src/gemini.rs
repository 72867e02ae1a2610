//! Streaming chat against the Gemini API

use crate::error::{LLMError, Result};
use crate::message::Message;
use crate::sse::SseDecoder;
use async_trait::async_trait;
use chatvrm_core::{GeminiConfig, RetryConfig};
use futures_util::StreamExt;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, warn};

/// Reply text pieces in arrival order
pub type ChatStream = ReceiverStream<Result<String>>;

/// Anything that can stream a reply to a conversation
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    /// All but the last message form the history; the last one is the turn
    /// being answered
    pub fn from_messages(messages: &[Message]) -> Result<Self> {
        let (latest, history) = messages.split_last().ok_or(LLMError::EmptyConversation)?;

        let contents = history
            .iter()
            .chain(std::iter::once(latest))
            .map(|m| Content {
                role: m.role.gemini_role(),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        Ok(Self { contents })
    }
}

/// Delay before retry number `attempt` (0-based): `base * 2^attempt` plus
/// `jitter_ms`
pub fn backoff_delay(attempt: u32, retry: &RetryConfig, jitter_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    let base = retry.base_delay_ms.saturating_mul(factor);
    Duration::from_millis(base.saturating_add(jitter_ms))
}

fn random_jitter(retry: &RetryConfig) -> u64 {
    if retry.max_jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..retry.max_jitter_ms)
    }
}

/// Text of one streamed response chunk
pub fn chunk_text(chunk: &Value) -> String {
    chunk["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        config.validate().map_err(LLMError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LLMError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Stream a reply using `api_key`, retrying rate-limited requests with
    /// exponential backoff
    pub async fn chat_stream_with_key(&self, messages: &[Message], api_key: &str) -> Result<ChatStream> {
        if api_key.is_empty() {
            return Err(LLMError::MissingApiKey);
        }
        let body = GenerateRequest::from_messages(messages)?;
        let retry = &self.config.retry;

        let mut attempt = 0;
        let response = loop {
            let result = self
                .client
                .post(self.stream_url())
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    error!("Gemini API Error: {}", e);
                    return Err(LLMError::Gemini);
                }
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < retry.max_retries {
                let delay = backoff_delay(attempt, retry, random_jitter(retry));
                warn!(
                    "Too Many Requests. Retrying in {:.3} seconds... (Retry {}/{})",
                    delay.as_secs_f64(),
                    attempt + 1,
                    retry.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                error!("Gemini API Error: HTTP {}: {}", status, text);
                return Err(LLMError::Gemini);
            }

            break response;
        };

        debug!("Gemini stream opened after {} retries", attempt);

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        error!("Gemini stream interrupted: {}", e);
                        let _ = tx.send(Err(LLMError::Gemini)).await;
                        return;
                    }
                };
                for payload in decoder.push(&chunk) {
                    if !forward(&tx, &payload).await {
                        return;
                    }
                }
            }
            if let Some(payload) = decoder.finish() {
                forward(&tx, &payload).await;
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

/// Send the text of one payload; false once the receiver is gone or the
/// payload was unreadable
async fn forward(tx: &mpsc::Sender<Result<String>>, payload: &str) -> bool {
    if payload.trim().is_empty() {
        return true;
    }
    let text = match serde_json::from_str::<Value>(payload) {
        Ok(chunk) => chunk_text(&chunk),
        Err(e) => {
            let _ = tx.send(Err(LLMError::Json(e))).await;
            return false;
        }
    };
    if text.is_empty() {
        return true;
    }
    tx.send(Ok(text)).await.is_ok()
}

#[async_trait]
impl ChatProvider for GeminiClient {
    async fn chat_stream(&self, messages: &[Message]) -> Result<ChatStream> {
        let key = self.config.api_key.clone().unwrap_or_default();
        self.chat_stream_with_key(messages, &key).await
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Drain a reply stream into one string, stopping at the first error
pub async fn collect_reply(mut stream: ChatStream) -> Result<String> {
    let mut reply = String::new();
    while let Some(piece) = stream.next().await {
        reply.push_str(&piece?);
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_roles_and_order() {
        let messages = vec![
            Message::system("You are Ai."),
            Message::assistant("[happy]Hello!"),
            Message::user("Hi"),
        ];
        let body = serde_json::to_value(GenerateRequest::from_messages(&messages).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "You are Ai."}]},
                    {"role": "model", "parts": [{"text": "[happy]Hello!"}]},
                    {"role": "user", "parts": [{"text": "Hi"}]},
                ]
            })
        );
    }

    #[test]
    fn test_empty_conversation_rejected() {
        assert!(matches!(
            GenerateRequest::from_messages(&[]),
            Err(LLMError::EmptyConversation)
        ));
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryConfig::default();
        assert_eq!(backoff_delay(0, &retry, 0), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3, &retry, 250), Duration::from_millis(8250));
        assert_eq!(backoff_delay(200, &retry, 0), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_jitter_within_bound() {
        let retry = RetryConfig::default();
        for _ in 0..100 {
            assert!(random_jitter(&retry) < 1000);
        }
        let none = RetryConfig {
            max_jitter_ms: 0,
            ..RetryConfig::default()
        };
        assert_eq!(random_jitter(&none), 0);
    }

    #[test]
    fn test_chunk_text() {
        let chunk = json!({"candidates": [{"content": {"parts": [{"text": "こん"}, {"text": "にちは"}]}}]});
        assert_eq!(chunk_text(&chunk), "こんにちは");
        assert_eq!(chunk_text(&json!({"usageMetadata": {}})), "");
    }

    #[test]
    fn test_stream_url() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert_eq!(
            client.stream_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        let err = client.chat_stream(&[Message::user("hi")]).await.unwrap_err();
        assert!(matches!(err, LLMError::MissingApiKey));
    }
}
