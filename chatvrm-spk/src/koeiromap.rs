//! Koeiromap / Koemotion voice synthesis client

use crate::error::SpeechError;
use chatvrm_core::{KoeiromapConfig, TalkStyle};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Request body of the legacy Koeiromap endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KoeiromapV0Request<'a> {
    pub text: &'a str,
    pub speaker_x: f64,
    pub speaker_y: f64,
    pub style: TalkStyle,
}

/// Request body of the Koemotion inference endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KoemotionRequest<'a> {
    pub text: &'a str,
    pub version: &'static str,
    pub speaker_x: f64,
    pub speaker_y: f64,
    pub style: TalkStyle,
    pub style_predict: bool,
    pub seed: u64,
    pub speed: f32,
    pub volume: f32,
    pub output_format: &'a str,
    pub output_bitrate: u32,
    pub facemotion: bool,
    pub streaming: bool,
}

/// Synthesized audio as returned by the service, usually a base64 data URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub audio: String,
}

#[derive(Deserialize)]
struct RawResponse {
    audio: Option<String>,
}

/// The free tier only voices talk, happy and sad; anything else falls back
/// to talk
pub fn free_tier_style(style: TalkStyle) -> TalkStyle {
    if style.is_free_tier() {
        style
    } else {
        TalkStyle::Talk
    }
}

pub struct KoeiromapClient {
    client: Client,
    config: KoeiromapConfig,
}

impl KoeiromapClient {
    pub fn new(config: KoeiromapConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SpeechError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &KoeiromapConfig {
        &self.config
    }

    pub fn v0_request<'a>(&self, message: &'a str, speaker_x: f64, speaker_y: f64, style: TalkStyle) -> KoeiromapV0Request<'a> {
        KoeiromapV0Request {
            text: message,
            speaker_x,
            speaker_y,
            style,
        }
    }

    /// Koemotion body for `message`; the text is trimmed and the style
    /// reduced to what the free tier accepts
    pub fn free_v1_request<'a>(&'a self, message: &'a str, speaker_x: f64, speaker_y: f64, style: TalkStyle) -> KoemotionRequest<'a> {
        KoemotionRequest {
            text: message.trim(),
            version: "2.0",
            speaker_x,
            speaker_y,
            style: free_tier_style(style),
            style_predict: false,
            seed: self.config.seed,
            speed: self.config.speed,
            volume: self.config.volume,
            output_format: &self.config.output_format,
            output_bitrate: self.config.output_bitrate,
            facemotion: false,
            streaming: false,
        }
    }

    /// Legacy endpoint; needs no key
    pub async fn koeiromap_v0(
        &self,
        message: &str,
        speaker_x: f64,
        speaker_y: f64,
        style: TalkStyle,
    ) -> Result<VoiceResponse, SpeechError> {
        let body = self.v0_request(message, speaker_x, speaker_y, style);
        debug!("Koeiromap v0 request: {} chars, style {}", message.chars().count(), style);

        let response = self
            .client
            .post(&self.config.legacy_endpoint)
            .header("Content-Type", "application/json; charset=UTF-8")
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        Self::read_audio(response).await
    }

    /// Koemotion free tier, authenticated with a subscription key
    pub async fn koeiromap_free_v1(
        &self,
        message: &str,
        speaker_x: f64,
        speaker_y: f64,
        style: TalkStyle,
        api_key: &str,
    ) -> Result<VoiceResponse, SpeechError> {
        if api_key.is_empty() {
            return Err(SpeechError::Config("Koemotion API key not provided".to_string()));
        }

        let body = self.free_v1_request(message, speaker_x, speaker_y, style);
        debug!("Koemotion request: {} chars, style {}", body.text.chars().count(), body.style);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .header("Cache-Control", "no-cache")
            .header("Ocp-Apim-Subscription-Key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        Self::read_audio(response).await
    }

    async fn read_audio(response: reqwest::Response) -> Result<VoiceResponse, SpeechError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Koemotion API error response ({}): {}", status, error_text);
            return Err(SpeechError::Api(status_text(status)));
        }

        let raw: RawResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Request(format!("Failed to read response: {}", e)))?;

        raw.audio
            .map(|audio| VoiceResponse { audio })
            .ok_or(SpeechError::MissingAudio)
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}
