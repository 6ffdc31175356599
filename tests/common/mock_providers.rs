/*!
 * Test doubles built on top of the library's `MockProvider`.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use subgloss::providers::mock::MockProvider;
use subgloss::subtitle_processor::TranslationUnit;
use subgloss::translation::{
    ChunkTranslator, PromptLanguages, TranslationOptions, TranslationResult, TranslationService,
};

/// Options with the given chunking and zero back-off
pub fn fast_options(chunk_size: usize, max_concurrent_requests: usize) -> TranslationOptions {
    TranslationOptions {
        chunk_size,
        max_concurrent_requests,
        retry_backoff: Duration::ZERO,
        ..Default::default()
    }
}

/// Translation service around a mock provider
pub fn mock_service(provider: MockProvider, options: TranslationOptions) -> TranslationService {
    TranslationService::with_provider(Arc::new(provider), options, PromptLanguages::default())
}

/// Chunk translator that records the order chunks were started and finished
pub struct RecordingChunkTranslator {
    /// Per-chunk delay in milliseconds, by chunk index
    delays_ms: Vec<u64>,
    started: Mutex<Vec<usize>>,
    finished: Mutex<Vec<usize>>,
}

impl RecordingChunkTranslator {
    pub fn new(delays_ms: Vec<u64>) -> Self {
        Self {
            delays_ms,
            started: Mutex::new(Vec::new()),
            finished: Mutex::new(Vec::new()),
        }
    }

    pub fn started(&self) -> Vec<usize> {
        self.started.lock().clone()
    }

    pub fn finished(&self) -> Vec<usize> {
        self.finished.lock().clone()
    }
}

#[async_trait]
impl ChunkTranslator for RecordingChunkTranslator {
    async fn translate_chunk(&self, chunk_index: usize, chunk: &[TranslationUnit]) -> Vec<TranslationResult> {
        self.started.lock().push(chunk_index);
        let delay = self.delays_ms.get(chunk_index).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.finished.lock().push(chunk_index);

        chunk
            .iter()
            .map(|unit| TranslationResult::new(unit.unique_id.clone(), format!("T({})", unit.original_text)))
            .collect()
    }
}
