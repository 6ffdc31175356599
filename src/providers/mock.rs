/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scripted provider that simulates different behaviors:
 * - `MockProvider::working()` - Translates every line it is sent
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::malformed()` - Answers with text that contains no JSON
 * - `MockProvider::short_by_one()` - Drops the last line of every chunk
 *
 * Chunk requests are recognised by the `linesToTranslate` payload embedded in
 * the prompt; anything else is treated as a glossary extraction request and
 * answered with the configured suggestion list.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, Provider};
use crate::subtitle_processor::TranslationUnit;
use crate::translation::prompts::{
    extract_chunk_payload, TranslatedLinesResponse, TranslationResult,
};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns prose without any JSON object
    Malformed,
    /// Returns one line fewer than requested
    ShortByOne,
    /// Returns an empty response
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Requests currently awaiting a response
    in_flight: Arc<AtomicUsize>,
    /// Highest value `in_flight` reached
    peak_in_flight: Arc<AtomicUsize>,
    /// Every request received, in arrival order
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Per-line translation (defaults to `[TRANSLATED] {text}`)
    translator: Option<fn(&TranslationUnit) -> String>,
    /// Chunks for which this returns true fail with a 503
    fail_when: Option<fn(&[TranslationUnit]) -> bool>,
    /// Response delay in milliseconds, computed from the chunk
    delay: Option<fn(&[TranslationUnit]) -> u64>,
    /// Fixed delay for every request
    fixed_delay_ms: u64,
    /// Answer to extraction requests
    suggestions: String,
}

/// Decrements the in-flight counter when a request ends, even if cancelled
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            translator: None,
            fail_when: None,
            delay: None,
            fixed_delay_ms: 0,
            suggestions: String::new(),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that answers without JSON
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that drops the last line of each chunk
    pub fn short_by_one() -> Self {
        Self::new(MockBehavior::ShortByOne)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set the per-line translation
    pub fn with_translator(mut self, translator: fn(&TranslationUnit) -> String) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Fail every request whose chunk matches `predicate`
    pub fn with_failure_when(mut self, predicate: fn(&[TranslationUnit]) -> bool) -> Self {
        self.fail_when = Some(predicate);
        self
    }

    /// Delay each chunk response by `delay(chunk)` milliseconds
    pub fn with_delay_fn(mut self, delay: fn(&[TranslationUnit]) -> u64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay every response by `delay_ms`
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.fixed_delay_ms = delay_ms;
        self
    }

    /// Set the answer to extraction requests
    pub fn with_suggestions(mut self, suggestions: impl Into<String>) -> Self {
        self.suggestions = suggestions.into();
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent requests observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Translate a whole chunk the way a well-behaved model would
    pub fn translate_units(&self, units: &[TranslationUnit]) -> Vec<TranslationResult> {
        units
            .iter()
            .map(|unit| {
                let text = match self.translator {
                    Some(translator) => translator(unit),
                    None => format!("[TRANSLATED] {}", unit.original_text),
                };
                TranslationResult::new(unit.unique_id.clone(), text)
            })
            .collect()
    }

    fn render(lines: Vec<TranslationResult>) -> Result<String, ProviderError> {
        serde_json::to_string(&TranslatedLinesResponse {
            translated_lines: lines,
        })
        .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            in_flight: Arc::clone(&self.in_flight),
            peak_in_flight: Arc::clone(&self.peak_in_flight),
            requests: Arc::clone(&self.requests),
            translator: self.translator,
            fail_when: self.fail_when,
            delay: self.delay,
            fixed_delay_ms: self.fixed_delay_ms,
            suggestions: self.suggestions.clone(),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        let payload = extract_chunk_payload(&request.prompt);
        self.requests.lock().push(request);

        let units: &[TranslationUnit] = payload
            .as_ref()
            .map(|p| p.lines_to_translate.as_slice())
            .unwrap_or(&[]);

        let mut delay_ms = self.fixed_delay_ms;
        if let Some(delay) = self.delay {
            delay_ms += delay(units);
        }
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(predicate) = self.fail_when {
            if payload.is_some() && predicate(units) {
                return Err(ProviderError::ApiError {
                    status_code: 503,
                    message: "Simulated failure for this chunk".to_string(),
                });
            }
        }

        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                Err(ProviderError::ApiError {
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                    status_code: 503,
                })
            }

            MockBehavior::Malformed => Ok("I'm sorry, I can't produce JSON today.".to_string()),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::ShortByOne if payload.is_some() => {
                let mut lines = self.translate_units(units);
                lines.pop();
                Self::render(lines)
            }

            _ if payload.is_some() => Self::render(self.translate_units(units)),

            _ => Ok(self.suggestions.clone()),
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
