/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use subgloss::app_config::{Config, LogLevel, TranslationProvider};
use subgloss::errors::ConfigError;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "ko");
    assert_eq!(config.target_language, "zh");
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);
    assert_eq!(config.log_level, LogLevel::Info);

    let common = &config.translation.common;
    assert_eq!(common.chunk_size, 100);
    assert_eq!(common.concurrent_requests, 3);
    assert_eq!(common.max_attempts, 3);
    assert_eq!(common.retry_backoff_ms, 1000);
    assert_eq!(common.fallback_marker, "[翻譯失敗]");

    assert_eq!(config.translation.get_model(), "gemini-2.5-flash");
    assert_eq!(config.translation.get_timeout_secs(), 120);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.source_language = "qqq".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    config.source_language = "ko".to_string();

    config.translation.common.chunk_size = 0;
    assert!(config.validate().is_err());
    config.translation.common.chunk_size = 50;

    config.translation.common.concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.translation.common.concurrent_requests = 1;

    config.translation.common.temperature = Some(3.5);
    assert!(config.validate().is_err());
    config.translation.common.temperature = Some(0.3);

    config.translation.active_provider_config_mut().endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
    config.translation.active_provider_config_mut().endpoint = String::new();

    assert!(config.validate().is_ok());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(created.target_language, "zh");

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.translation.get_model(), created.translation.get_model());
    Ok(())
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "source_language": "ja",
            "target_language": "zh",
            "translation": {
                "provider": "ollama",
                "available_providers": [{ "type": "ollama", "model": "qwen2.5:7b" }],
                "common": { "chunk_size": 40 }
            }
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.get_model(), "qwen2.5:7b");
    assert_eq!(config.translation.common.chunk_size, 40);
    assert_eq!(config.translation.common.concurrent_requests, 3);
    assert_eq!(config.target_language_label(), "Taiwanese Traditional Chinese");
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

#[test]
fn test_provider_fromStr_shouldAcceptLowercaseNames() {
    assert_eq!("openai".parse::<TranslationProvider>().ok(), Some(TranslationProvider::OpenAI));
    assert_eq!("Gemini".parse::<TranslationProvider>().ok(), Some(TranslationProvider::Gemini));
    assert!("lmstudio".parse::<TranslationProvider>().is_err());
}

#[test]
fn test_apiKey_fromConfig_shouldWinOverEnvironment() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Anthropic;
    config.translation.active_provider_config_mut().api_key = "sk-from-config".to_string();
    assert_eq!(config.translation.get_api_key(), "sk-from-config");
}

#[test]
fn test_ollama_shouldNotNeedApiKeyEnvVar() {
    assert_eq!(TranslationProvider::Ollama.api_key_env_var(), None);
    assert_eq!(TranslationProvider::Gemini.api_key_env_var(), Some("GEMINI_API_KEY"));
}
