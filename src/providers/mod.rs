/*!
 * Provider implementations for different LLM services.
 *
 * This module contains client implementations for the supported providers:
 * - Gemini: Google Generative Language API (native response schemas)
 * - OpenAI: Chat Completions API (json_schema response format)
 * - Anthropic: Messages API
 * - Ollama: Local LLM server
 * - Mock: scripted provider for tests
 *
 * Clients perform a single HTTP exchange per call. Retrying is the caller's
 * business, so a failed call surfaces immediately as a `ProviderError`.
 */

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::{ConfigError, ProviderError};

/// Provider-neutral request.
///
/// Two shapes are used by the engine: free text in, free text out (term
/// extraction), and JSON payload in, schema-constrained JSON out (translation).
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Static policy text sent as the system prompt
    pub system_instruction: Option<String>,

    /// The user prompt: context plus payload
    pub prompt: String,

    /// JSON schema the response must satisfy, if structured output is required
    pub response_schema: Option<Value>,

    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a free-text request
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the system instruction
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Require a structured response matching `schema`
    pub fn schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request and return the raw response text
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// Human-readable provider name for logs
    fn name(&self) -> &str;
}

/// Build the provider selected in the configuration.
///
/// Fails with `ConfigError::MissingCredential` when the provider needs an API
/// key and none is configured.
pub fn build_provider(config: &TranslationConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let model = config.get_model();
    let endpoint = config.get_endpoint();
    let timeout_secs = config.get_timeout_secs();

    let require_key = |provider: &TranslationProvider| -> Result<String, ConfigError> {
        let key = config.get_api_key();
        if key.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                provider: provider.display_name().to_string(),
                env_var: provider.api_key_env_var().unwrap_or_default().to_string(),
            });
        }
        Ok(key)
    };

    let provider: Arc<dyn Provider> = match &config.provider {
        TranslationProvider::Gemini => Arc::new(gemini::Gemini::new(
            require_key(&config.provider)?,
            endpoint,
            model,
            timeout_secs,
        )),
        TranslationProvider::OpenAI => Arc::new(openai::OpenAI::new(
            require_key(&config.provider)?,
            endpoint,
            model,
            timeout_secs,
        )),
        TranslationProvider::Anthropic => Arc::new(anthropic::Anthropic::new(
            require_key(&config.provider)?,
            endpoint,
            model,
            timeout_secs,
        )),
        TranslationProvider::Ollama => Arc::new(ollama::Ollama::new(endpoint, model, timeout_secs)),
    };

    Ok(provider)
}

/// Map a reqwest transport error, keeping client-side timeouts distinct
pub(crate) fn transport_error(error: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::from_transport(error)
    }
}

/// Truncate a response body for log and error messages
pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > 500 {
        let head: String = text.chars().take(500).collect();
        format!("{}…", head)
    } else {
        text.to_string()
    }
}

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;
