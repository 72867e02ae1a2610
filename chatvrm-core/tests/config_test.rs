//! Loading configuration files from disk

use chatvrm_core::{ChatVrmConfig, ConfigError};
use std::io::Write;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_from_file_toml() {
    let file = write_config(
        ".toml",
        r#"
log_level = "debug"

[segmenter]
max_length = 40

[voice]
speakerX = -1.5
speakerY = 2.0
"#,
    );
    let config = ChatVrmConfig::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.segmenter.max_length, 40);
    assert_eq!(config.voice.speaker_x, -1.5);
    assert_eq!(config.server.port, 3000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_file_yaml() {
    let file = write_config(
        ".yaml",
        "gemini:\n  model: gemini-2.0-flash\n  retry:\n    max_retries: 2\nexpression:\n  auto_blink: false\n",
    );
    let config = ChatVrmConfig::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.gemini.model, "gemini-2.0-flash");
    assert_eq!(config.gemini.retry.max_retries, 2);
    assert_eq!(config.gemini.retry.base_delay_ms, 1000);
    assert!(!config.expression.auto_blink);
}

#[test]
fn test_from_file_unknown_extension_sniffs_format() {
    let file = write_config(".conf", r#"{"server": {"port": 8080}}"#);
    let config = ChatVrmConfig::from_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.server.port, 8080);
}

#[test]
fn test_from_file_reports_parse_errors() {
    let file = write_config(".toml", "segmenter = [");
    assert!(matches!(
        ChatVrmConfig::from_file(file.path().to_str().unwrap()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        ChatVrmConfig::from_file("/nonexistent/chatvrm.toml"),
        Err(ConfigError::Io(_))
    ));
}
