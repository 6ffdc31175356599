/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService` struct: the selected provider
 * plus the run options (chunking, concurrency, retry, timeout) every phase
 * reads. It is cheap to clone and shared by the analysis and batch
 * orchestrators.
 */

use log::{debug, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{ConfigError, ProviderError};
use crate::providers::{build_provider, CompletionRequest, Provider};

use super::prompts::PromptLanguages;

/// Translation options for customizing the translation process
#[derive(Debug, Clone)]
pub struct TranslationOptions {
    /// Maximum number of lines per request
    pub chunk_size: usize,

    /// Maximum number of concurrent requests
    pub max_concurrent_requests: usize,

    /// Attempts per chunk before the fallback is used
    pub max_attempts: u32,

    /// Back-off unit; attempt `n` waits `n` units before the next one
    pub retry_backoff: Duration,

    /// Upper bound on a single provider call
    pub request_timeout: Duration,

    /// Prefix for lines whose chunk could not be translated
    pub fallback_marker: String,

    /// Temperature applied to requests that do not set one
    pub temperature: Option<f32>,

    /// Interval of the simulated analysis progress
    pub analysis_tick: Duration,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            max_concurrent_requests: 3,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1000),
            request_timeout: Duration::from_secs(120),
            fallback_marker: "[翻譯失敗]".to_string(),
            temperature: None,
            analysis_tick: Duration::from_millis(100),
        }
    }
}

impl TranslationOptions {
    /// Options from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let common = &config.translation.common;
        Self {
            chunk_size: common.chunk_size.max(1),
            max_concurrent_requests: common.concurrent_requests.max(1),
            max_attempts: common.max_attempts.max(1),
            retry_backoff: Duration::from_millis(common.retry_backoff_ms),
            request_timeout: Duration::from_secs(config.translation.get_timeout_secs()),
            fallback_marker: common.fallback_marker.clone(),
            temperature: common.temperature,
            analysis_tick: Duration::from_millis(common.analysis_tick_ms.max(1)),
        }
    }
}

/// Main translation service for subtitle translation
#[derive(Debug, Clone)]
pub struct TranslationService {
    /// Provider implementation
    provider: Arc<dyn Provider>,

    /// Translation options
    pub options: TranslationOptions,

    /// Language labels used in prompts
    pub languages: PromptLanguages,
}

impl TranslationService {
    /// Create a translation service from the configuration.
    ///
    /// Fails when the selected provider needs a credential that is not set.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let provider = build_provider(&config.translation)?;
        debug!(
            "Using {} with model {}",
            provider.name(),
            config.translation.get_model()
        );

        Ok(Self {
            provider,
            options: TranslationOptions::from_config(config),
            languages: PromptLanguages::new(
                config.source_language_label(),
                config.target_language_label(),
            ),
        })
    }

    /// Create a translation service around an existing provider
    pub fn with_provider(
        provider: Arc<dyn Provider>,
        options: TranslationOptions,
        languages: PromptLanguages,
    ) -> Self {
        Self {
            provider,
            options,
            languages,
        }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send one request, bounded by the configured timeout.
    ///
    /// A call that exceeds the timeout is dropped and reported as
    /// `ProviderError::Timeout`.
    pub async fn complete(&self, mut request: CompletionRequest) -> Result<String, ProviderError> {
        if request.temperature.is_none() {
            request.temperature = self.options.temperature;
        }

        let start_time = Instant::now();
        let result = tokio::time::timeout(self.options.request_timeout, self.provider.complete(request)).await;

        match result {
            Ok(response) => {
                debug!(
                    "{} answered in {:?}",
                    self.provider.name(),
                    start_time.elapsed()
                );
                response
            }
            Err(_) => {
                warn!(
                    "{} did not answer within {:?}",
                    self.provider.name(),
                    self.options.request_timeout
                );
                Err(ProviderError::Timeout(self.options.request_timeout.as_secs()))
            }
        }
    }
}
