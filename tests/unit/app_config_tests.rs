/*!
 * Tests for application configuration functionality
 */

use deckcast::app_config::{Config, LlmProvider, LogLevel};

fn valid_config() -> Config {
    let mut config = Config::default();
    config.llm.api_key = "test-llm-key".to_string();
    config.speech.api_key = "test-tts-key".to_string();
    config
}

/// Test configuration validation with explicit keys
#[test]
fn test_validate_withKeys_shouldSucceed() {
    assert!(valid_config().validate().is_ok());
}

/// A missing LLM key is reported with the variable to set
#[test]
fn test_validate_withoutLlmKey_shouldNameEnvironmentVariable() {
    let mut config = valid_config();
    config.llm.api_key.clear();
    config.llm.api_key_env = "DECKCAST_TEST_UNSET_LLM_KEY".to_string();

    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("DECKCAST_TEST_UNSET_LLM_KEY"));
}

/// Ollama runs locally and needs no key
#[test]
fn test_validate_withOllama_shouldNotRequireLlmKey() {
    let mut config = valid_config();
    config.llm.provider = LlmProvider::Ollama;
    config.llm.api_key.clear();
    config.llm.api_key_env = "DECKCAST_TEST_UNSET_LLM_KEY".to_string();

    assert!(config.validate().is_ok());
}

/// A missing speech key fails validation
#[test]
fn test_validate_withoutSpeechKey_shouldFail() {
    let mut config = valid_config();
    config.speech.api_key.clear();
    config.speech.api_key_env = "DECKCAST_TEST_UNSET_TTS_KEY".to_string();

    assert!(config.validate().is_err());
}

/// Zero sized or zero rate settings are rejected
#[test]
fn test_validate_withZeroValues_shouldFail() {
    let mut config = valid_config();
    config.renderer.viewport_width = 0;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.assembler.fps = 0;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.renderer.policy.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = valid_config();
    config.speech.max_input_chars = 0;
    assert!(config.validate().is_err());
}

/// A missing config file is created with defaults and can be read back
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    assert!(path.is_file());

    let loaded = Config::load_or_create(&path).unwrap();
    assert_eq!(loaded.server.port, created.server.port);
    assert_eq!(loaded.llm.model, created.llm.model);
    assert_eq!(loaded.log_level, LogLevel::Info);
}

/// A malformed config file is an error, not silently replaced
#[test]
fn test_loadOrCreate_withInvalidJson_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(Config::load_or_create(&path).is_err());
}

/// Default storage directories live under the user cache
#[test]
fn test_defaultStorage_shouldSeparateRunsAndVideos() {
    let config = Config::default();
    assert_ne!(config.storage.work_dir, config.storage.output_dir);
    assert!(config.storage.work_dir.ends_with("deckcast/runs"));
    assert!(config.storage.output_dir.ends_with("deckcast/videos"));
    assert_eq!(config.server.bind_address(), "127.0.0.1:8000");
}
