// Configuration for the chatvrm pipeline and its glue services

use crate::types::VoiceParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters after which generated text is split into speakable chunks
pub const DEFAULT_TERMINATORS: &str = ".!?。．！？\n";

/// Default maximum chunk length, in UTF-16 code units
pub const DEFAULT_MAX_LENGTH: usize = 60;

/// Sentence segmenter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Maximum chunk length in UTF-16 code units (0 disables hard wrapping)
    pub max_length: usize,

    /// Terminator characters; a chunk ends right after any of them
    pub terminators: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            terminators: DEFAULT_TERMINATORS.to_string(),
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<(), String> {
        const MAX_MAX_LENGTH: usize = 10_000;
        if self.max_length > MAX_MAX_LENGTH {
            return Err(format!("Segmenter max_length too large (max {})", MAX_MAX_LENGTH));
        }
        if self.terminators.chars().count() > 64 {
            return Err("Too many segment terminators (max 64)".to_string());
        }
        if self.terminators.contains(['[', ']']) {
            return Err("Brackets are reserved for emotion tags and cannot terminate segments".to_string());
        }
        Ok(())
    }
}

/// Expression controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionConfig {
    /// Lip-sync overlay gain while the base expression is neutral
    pub neutral_lip_sync_gain: f32,

    /// Lip-sync overlay gain while an emotive expression deforms the mouth
    pub emotive_lip_sync_gain: f32,

    /// Enable automatic eye blinking
    pub auto_blink: bool,

    /// Seconds the eyes stay closed during a blink
    pub blink_close_secs: f64,

    /// Seconds the eyes stay open between blinks
    pub blink_open_secs: f64,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            neutral_lip_sync_gain: 0.5,
            emotive_lip_sync_gain: 0.25,
            auto_blink: true,
            blink_close_secs: 0.12,
            blink_open_secs: 5.0,
        }
    }
}

impl ExpressionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.neutral_lip_sync_gain) {
            return Err("Neutral lip-sync gain must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.emotive_lip_sync_gain) {
            return Err("Emotive lip-sync gain must be between 0.0 and 1.0".to_string());
        }
        if !self.blink_close_secs.is_finite() || self.blink_close_secs <= 0.0 {
            return Err("Blink close duration must be a positive number of seconds".to_string());
        }
        if !self.blink_open_secs.is_finite() || self.blink_open_secs <= 0.0 {
            return Err("Blink open duration must be a positive number of seconds".to_string());
        }
        if self.blink_close_secs > 10.0 {
            return Err("Blink close duration too large (max 10 seconds)".to_string());
        }
        Ok(())
    }
}

/// Koeiromap / Koemotion voice synthesis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KoeiromapConfig {
    /// Subscription key (optional, can be set via KOEIROMAP_API_KEY)
    pub api_key: Option<String>,

    /// Koemotion inference endpoint
    pub endpoint: String,

    /// Legacy koeiro endpoint (no key required)
    pub legacy_endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub seed: u64,
    pub speed: f32,
    pub volume: f32,
    pub output_format: String,
    pub output_bitrate: u32,
}

impl Default for KoeiromapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.rinna.co.jp/koemotion/infer".to_string(),
            legacy_endpoint: "https://api.rinna.co.jp/models/cttse/koeiro".to_string(),
            timeout_secs: 30,
            seed: 984298612,
            speed: 1.0,
            volume: 0.0,
            output_format: "mp3".to_string(),
            output_bitrate: 128,
        }
    }
}

impl KoeiromapConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_endpoint("Koeiromap endpoint", &self.endpoint)?;
        validate_endpoint("Koeiromap legacy endpoint", &self.legacy_endpoint)?;
        validate_timeout(self.timeout_secs)?;
        if let Some(ref key) = self.api_key {
            validate_api_key(key)?;
        }
        if !(0.5..=2.0).contains(&self.speed) {
            return Err("Koeiromap speed must be between 0.5 and 2.0".to_string());
        }
        if !(-2.0..=2.0).contains(&self.volume) {
            return Err("Koeiromap volume must be between -2.0 and 2.0".to_string());
        }
        if !matches!(self.output_format.as_str(), "mp3" | "wav") {
            return Err("Koeiromap output format must be 'mp3' or 'wav'".to_string());
        }
        Ok(())
    }
}

/// Retry configuration for rate-limited API calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts after the first request
    pub max_retries: u32,

    /// Base delay in milliseconds, doubled on every attempt
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to each delay
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1000,
            max_jitter_ms: 1000,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries > 16 {
            return Err("Max retries too large (max 16)".to_string());
        }
        if self.base_delay_ms > 60_000 {
            return Err("Base delay too large (max 60000 ms)".to_string());
        }
        if self.max_jitter_ms > 60_000 {
            return Err("Jitter too large (max 60000 ms)".to_string());
        }
        Ok(())
    }
}

/// Gemini chat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (optional, can be set via GEMINI_API_KEY)
    pub api_key: Option<String>,

    /// Generative Language API base URL
    pub endpoint: String,

    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub retry: RetryConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl GeminiConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_endpoint("Gemini endpoint", &self.endpoint)?;
        validate_timeout(self.timeout_secs)?;
        if let Some(ref key) = self.api_key {
            validate_api_key(key)?;
        }
        if self.model.is_empty() || self.model.len() > 128 {
            return Err("Gemini model name must be 1-128 chars".to_string());
        }
        if !self
            .model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
        {
            return Err("Gemini model name contains invalid characters".to_string());
        }
        self.retry.validate()
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bind_address.is_empty() {
            return Err("Bind address cannot be empty".to_string());
        }
        if self.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Complete chatvrm configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatVrmConfig {
    pub segmenter: SegmenterConfig,
    pub voice: VoiceParams,
    pub expression: ExpressionConfig,
    pub koeiromap: KoeiromapConfig,
    pub gemini: GeminiConfig,
    pub server: ServerConfig,
    pub log_level: String,
}

impl Default for ChatVrmConfig {
    fn default() -> Self {
        Self {
            segmenter: SegmenterConfig::default(),
            voice: VoiceParams::default(),
            expression: ExpressionConfig::default(),
            koeiromap: KoeiromapConfig::default(),
            gemini: GeminiConfig::default(),
            server: ServerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ChatVrmConfig {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        if path.contains("..") {
            return Err(ConfigError::Io(format!("Path traversal detected: '{}'", path)));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".toml") {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if lower.ends_with(".json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Self::from_str(&content)
        }
    }

    /// Load configuration from a string of unknown format
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(config) = serde_json::from_str::<ChatVrmConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = toml::from_str::<ChatVrmConfig>(content) {
            return Ok(config);
        }

        if let Ok(config) = serde_yaml::from_str::<ChatVrmConfig>(content) {
            return Ok(config);
        }

        Err(ConfigError::Parse("Unknown format".to_string()))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Override fields from an environment-style lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("CHATVRM_HOST") {
            self.server.bind_address = host;
        }

        if let Some(port) = lookup("CHATVRM_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                self.server.port = p;
            }
        }

        if let Some(log_level) = lookup("CHATVRM_LOG_LEVEL") {
            self.log_level = log_level;
        }

        if let Some(max_length) = lookup("CHATVRM_MAX_LENGTH") {
            if let Ok(n) = max_length.parse::<usize>() {
                self.segmenter.max_length = n;
            }
        }

        if let Some(x) = lookup("CHATVRM_SPEAKER_X") {
            if let Ok(v) = x.parse::<f64>() {
                self.voice.speaker_x = v;
            }
        }

        if let Some(y) = lookup("CHATVRM_SPEAKER_Y") {
            if let Ok(v) = y.parse::<f64>() {
                self.voice.speaker_y = v;
            }
        }

        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }

        if let Some(key) = lookup("KOEIROMAP_API_KEY") {
            self.koeiromap.api_key = Some(key);
        }
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(&mut self, other: ChatVrmConfig) {
        let gemini_key = self.gemini.api_key.take();
        let koeiromap_key = self.koeiromap.api_key.take();

        self.segmenter = other.segmenter;
        self.voice = other.voice;
        self.expression = other.expression;
        self.koeiromap = other.koeiromap;
        self.gemini = other.gemini;
        self.server = other.server;
        self.log_level = other.log_level;

        // Keys are secrets; an unset key on the other side never clears ours
        if self.gemini.api_key.is_none() {
            self.gemini.api_key = gemini_key;
        }
        if self.koeiromap.api_key.is_none() {
            self.koeiromap.api_key = koeiromap_key;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segmenter.validate().map_err(ConfigError::Validation)?;
        self.voice.validate().map_err(ConfigError::Validation)?;
        self.expression.validate().map_err(ConfigError::Validation)?;
        self.koeiromap.validate().map_err(ConfigError::Validation)?;
        self.gemini.validate().map_err(ConfigError::Validation)?;
        self.server.validate().map_err(ConfigError::Validation)?;

        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(ConfigError::Validation(format!(
                "Unknown log level '{}'",
                self.log_level
            )));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for crate::error::Error {
    fn from(err: ConfigError) -> Self {
        crate::error::Error::Configuration(err.to_string())
    }
}

fn validate_endpoint(name: &str, endpoint: &str) -> Result<(), String> {
    if endpoint.is_empty() {
        return Err(format!("{} cannot be empty", name));
    }
    if endpoint.len() > 2048 {
        return Err(format!("{} URL too long (max 2048 chars)", name));
    }
    if endpoint.chars().any(|c| c == '\0' || c.is_control()) {
        return Err(format!("{} contains invalid characters", name));
    }
    // Plain HTTP is only accepted for loopback development servers
    let loopback = endpoint.starts_with("http://127.0.0.1")
        || endpoint.starts_with("http://localhost")
        || endpoint.starts_with("http://[::1]");
    if !endpoint.starts_with("https://") && !loopback {
        return Err(format!("{} must use HTTPS", name));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: u64) -> Result<(), String> {
    if timeout_secs == 0 {
        return Err("API timeout must be greater than 0".to_string());
    }
    if timeout_secs > 300 {
        return Err("API timeout too large (max 300 seconds)".to_string());
    }
    Ok(())
}

fn validate_api_key(key: &str) -> Result<(), String> {
    if key.len() > 512 {
        return Err("API key too long (max 512 chars)".to_string());
    }
    if key.chars().any(|c| c == '\0' || c.is_control()) {
        return Err("API key contains invalid characters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default_is_valid() {
        let config = ChatVrmConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.segmenter.max_length, 60);
        assert_eq!(config.expression.neutral_lip_sync_gain, 0.5);
        assert_eq!(config.expression.emotive_lip_sync_gain, 0.25);
        assert_eq!(config.gemini.retry.max_retries, 5);
    }

    #[test]
    fn test_segmenter_rejects_bracket_terminator() {
        let mut config = SegmenterConfig::default();
        config.terminators.push(']');
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expression_gain_bounds() {
        let mut config = ExpressionConfig::default();
        config.neutral_lip_sync_gain = 1.1;
        assert!(config.validate().is_err());

        config.neutral_lip_sync_gain = 1.0;
        config.emotive_lip_sync_gain = -0.1;
        assert!(config.validate().is_err());

        config.emotive_lip_sync_gain = 0.0;
        assert!(config.validate().is_ok());

        config.blink_close_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_endpoint_requires_https_except_loopback() {
        let mut config = KoeiromapConfig::default();
        config.endpoint = "http://example.com/infer".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "http://127.0.0.1:8080/infer".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CHATVRM_PORT", "8081"),
            ("CHATVRM_MAX_LENGTH", "40"),
            ("CHATVRM_SPEAKER_X", "-1.5"),
            ("GEMINI_API_KEY", "g-key"),
            ("CHATVRM_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = ChatVrmConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.segmenter.max_length, 40);
        assert_eq!(config.voice.speaker_x, -1.5);
        assert_eq!(config.voice.speaker_y, 3.0);
        assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.koeiromap.api_key, None);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_apply_env_ignores_unparseable_numbers() {
        let mut config = ChatVrmConfig::default();
        config.apply_env(|k| (k == "CHATVRM_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_merge_keeps_existing_keys() {
        let mut base = ChatVrmConfig::default();
        base.gemini.api_key = Some("secret".to_string());

        let mut other = ChatVrmConfig::default();
        other.server.port = 9000;
        base.merge(other);

        assert_eq!(base.server.port, 9000);
        assert_eq!(base.gemini.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_from_str_toml_and_yaml() {
        let toml_src = r#"
log_level = "warn"

[segmenter]
max_length = 30

[voice]
speakerX = 1.0
speakerY = 2.0
"#;
        let config = ChatVrmConfig::from_str(toml_src).unwrap();
        assert_eq!(config.segmenter.max_length, 30);
        assert_eq!(config.voice, VoiceParams::new(1.0, 2.0));
        assert_eq!(config.log_level, "warn");

        let yaml_src = "expression:\n  auto_blink: false\n";
        let config = ChatVrmConfig::from_str(yaml_src).unwrap();
        assert!(!config.expression.auto_blink);
        assert_eq!(config.segmenter.max_length, 60);
    }

    #[test]
    fn test_from_file_rejects_traversal() {
        let result = ChatVrmConfig::from_file("../etc/chatvrm.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut config = ChatVrmConfig::default();
        config.log_level = "verbose".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }
}
