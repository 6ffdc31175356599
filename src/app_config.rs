use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::errors::ConfigError;

// @module: Configuration file (`conf.json`), provider selection and credentials

/// Settings of one translation session, as stored in `conf.json`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Label used for the target language in prompts.
    /// Empty means the ISO English name of `target_language`.
    #[serde(default = "default_target_language_label")]
    pub target_language_label: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Gemini
    #[default]
    Gemini,
    // @provider: OpenAI
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    // @returns: Environment variable consulted when the config has no key
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key (falls back to the provider's env var when empty)
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Settings shared by every provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Maximum number of subtitle lines sent in one request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of chunks in flight at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Attempts per chunk before falling back to the marked original text
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Back-off unit in milliseconds; attempt `n` waits `n` units
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Prefix written before the original text of lines that failed to translate
    #[serde(default = "default_fallback_marker")]
    pub fallback_marker: String,

    /// Interval of the simulated analysis progress, in milliseconds
    #[serde(default = "default_analysis_tick_ms")]
    pub analysis_tick_ms: u64,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            concurrent_requests: default_concurrent_requests(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: None,
            fallback_marker: default_fallback_marker(),
            analysis_tick_ms: default_analysis_tick_ms(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_chunk_size() -> usize {
    100
}

fn default_concurrent_requests() -> usize {
    3
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_analysis_tick_ms() -> u64 {
    100
}

fn default_fallback_marker() -> String {
    "[翻譯失敗]".to_string()
}

fn default_target_language_label() -> String {
    "Taiwanese Traditional Chinese".to_string()
}

fn default_endpoint(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Gemini => "https://generativelanguage.googleapis.com".to_string(),
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        TranslationProvider::Anthropic => "https://api.anthropic.com".to_string(),
        TranslationProvider::Ollama => "http://localhost:11434".to_string(),
    }
}

fn default_model(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Gemini => "gemini-2.5-flash".to_string(),
        TranslationProvider::OpenAI => "gpt-4o-mini".to_string(),
        TranslationProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
        TranslationProvider::Ollama => "llama3.2:3b".to_string(),
    }
}

impl Config {
    /// Load the configuration from `path`, writing a default file when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            return Ok(config);
        }

        warn!("Config file not found at {:?}, creating default config.", path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {:?}", path))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values.
    ///
    /// Credentials are not checked here: a missing key is reported when a
    /// phase that needs the provider starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::language_utils::get_language_name(&self.source_language)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        crate::language_utils::get_language_name(&self.target_language)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let common = &self.translation.common;
        if common.chunk_size == 0 {
            return Err(ConfigError::InvalidValue("chunk_size must be at least 1".to_string()));
        }
        if common.concurrent_requests == 0 {
            return Err(ConfigError::InvalidValue(
                "concurrent_requests must be at least 1".to_string(),
            ));
        }
        if common.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("max_attempts must be at least 1".to_string()));
        }
        if let Some(temperature) = common.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidValue(format!(
                    "temperature {} is outside 0.0..=2.0",
                    temperature
                )));
            }
        }

        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint).map_err(|e| {
            ConfigError::InvalidValue(format!("Invalid endpoint URL '{}': {}", endpoint, e))
        })?;

        if self.translation.get_timeout_secs() == 0 {
            return Err(ConfigError::InvalidValue("timeout_secs must be at least 1".to_string()));
        }

        Ok(())
    }

    /// Label of the source language as used in prompts
    pub fn source_language_label(&self) -> String {
        crate::language_utils::get_language_name(&self.source_language)
            .unwrap_or_else(|_| self.source_language.clone())
    }

    /// Label of the target language as used in prompts
    pub fn target_language_label(&self) -> String {
        if !self.target_language_label.trim().is_empty() {
            return self.target_language_label.trim().to_string();
        }
        crate::language_utils::get_language_name(&self.target_language)
            .unwrap_or_else(|_| self.target_language.clone())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "ko".to_string(),
            target_language: "zh".to_string(),
            target_language_label: default_target_language_label(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str);
        let index = match position {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }
        default_model(&self.provider)
    }

    /// Get the API key for the active provider.
    ///
    /// The config file wins; otherwise the provider's environment variable is
    /// read. Empty when neither is set.
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        self.provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }
        default_endpoint(&self.provider)
    }

    /// Get the per-call timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .unwrap_or_else(default_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Gemini),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::Ollama),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
