/*!
 * Batch translation processing.
 *
 * This module splits the translation units of a document into chunks and
 * translates them through a fixed pool of workers sharing one FIFO queue.
 * Every chunk is retried with linear back-off; a chunk that keeps failing is
 * replaced by marked original text so the rest of the run can complete.
 * Results are written to a slot per chunk, so output order never depends on
 * completion order.
 */

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::{ChunkError, TranslationError};
use crate::subtitle_processor::{SubtitleDocument, TranslationUnit};

use super::core::TranslationService;
use super::glossary::Glossary;
use super::progress::{chunk_percentage, CurrentBlock, ProgressSink};
use super::prompts::{build_chunk_request, extract_json, TranslatedLinesResponse, TranslationResult};

/// Split `units` into consecutive chunks of at most `chunk_size` units.
///
/// A `chunk_size` of 0 is treated as 1.
pub fn chunk_units(units: &[TranslationUnit], chunk_size: usize) -> Vec<&[TranslationUnit]> {
    units.chunks(chunk_size.max(1)).collect()
}

/// Run `worker` over every task with at most `concurrency` tasks in flight.
///
/// Workers pull `(index, task)` pairs from a shared FIFO queue until it is
/// empty. The result of task `i` lands in slot `i`, so the returned vector is
/// in task order whatever order the tasks finished in.
pub async fn run_worker_pool<T, R, F, Fut>(tasks: Vec<T>, concurrency: usize, worker: F) -> Vec<R>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = tasks.len();
    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(tasks.into_iter().enumerate().collect());
    let slots: Mutex<Vec<Option<R>>> = Mutex::new((0..total).map(|_| None).collect());

    let (queue, slots_ref, worker) = (&queue, &slots, &worker);
    let workers = (0..concurrency.max(1).min(total.max(1))).map(move |_| async move {
        loop {
            // Dequeue is the only synchronised step; the lock is released before awaiting
            let next = queue.lock().pop_front();
            let Some((index, task)) = next else {
                break;
            };
            let result = worker(index, task).await;
            slots_ref.lock()[index] = Some(result);
        }
    });
    join_all(workers).await;

    slots.into_inner().into_iter().flatten().collect()
}

/// Translates one chunk. Never fails: an implementation that cannot
/// translate a chunk returns a fallback for each of its units.
#[async_trait]
pub trait ChunkTranslator: Send + Sync {
    async fn translate_chunk(&self, chunk_index: usize, chunk: &[TranslationUnit]) -> Vec<TranslationResult>;
}

/// Check a raw chunk response and re-key it into the chunk's input order.
pub fn validate_chunk_response(
    raw: &str,
    chunk: &[TranslationUnit],
) -> Result<Vec<TranslationResult>, ChunkError> {
    let json = extract_json(raw)
        .ok_or_else(|| ChunkError::Schema("no JSON object in response".to_string()))?;
    let response: TranslatedLinesResponse =
        serde_json::from_str(json).map_err(|e| ChunkError::Schema(e.to_string()))?;

    if response.translated_lines.len() != chunk.len() {
        return Err(ChunkError::CountMismatch {
            expected: chunk.len(),
            actual: response.translated_lines.len(),
        });
    }

    let expected_ids: HashSet<&str> = chunk.iter().map(|u| u.unique_id.as_str()).collect();
    let mut by_id: HashMap<String, String> = HashMap::with_capacity(chunk.len());
    for line in response.translated_lines {
        if !expected_ids.contains(line.unique_id.as_str()) {
            return Err(ChunkError::UnknownId(line.unique_id));
        }
        if by_id.contains_key(&line.unique_id) {
            return Err(ChunkError::DuplicateId(line.unique_id));
        }
        by_id.insert(line.unique_id, line.translated_text);
    }

    Ok(chunk
        .iter()
        .map(|unit| TranslationResult {
            unique_id: unit.unique_id.clone(),
            translated_text: by_id.remove(&unit.unique_id).unwrap_or_default(),
        })
        .collect())
}

/// Fallback results for a chunk that could not be translated
pub fn fallback_results(chunk: &[TranslationUnit], marker: &str) -> Vec<TranslationResult> {
    chunk
        .iter()
        .map(|unit| TranslationResult {
            unique_id: unit.unique_id.clone(),
            translated_text: format!("{} {}", marker, unit.original_text),
        })
        .collect()
}

/// `ChunkTranslator` backed by a `TranslationService`, with retry and fallback
pub struct RetryingChunkTranslator<'a> {
    service: &'a TranslationService,
    glossary: &'a Glossary,
    program_context: &'a str,
}

impl<'a> RetryingChunkTranslator<'a> {
    pub fn new(service: &'a TranslationService, glossary: &'a Glossary, program_context: &'a str) -> Self {
        Self {
            service,
            glossary,
            program_context,
        }
    }

    async fn attempt(&self, chunk: &[TranslationUnit]) -> Result<Vec<TranslationResult>, ChunkError> {
        let request = build_chunk_request(&self.service.languages, self.program_context, self.glossary, chunk)
            .map_err(|e| ChunkError::Schema(format!("failed to serialize chunk: {}", e)))?;
        let raw = self.service.complete(request).await?;
        validate_chunk_response(&raw, chunk)
    }
}

#[async_trait]
impl ChunkTranslator for RetryingChunkTranslator<'_> {
    async fn translate_chunk(&self, chunk_index: usize, chunk: &[TranslationUnit]) -> Vec<TranslationResult> {
        let options = &self.service.options;
        let max_attempts = options.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.attempt(chunk).await {
                Ok(results) => {
                    debug!("Chunk {} translated on attempt {}", chunk_index + 1, attempt);
                    return results;
                }
                Err(e) => {
                    match &e {
                        ChunkError::Provider(provider_error) => warn!(
                            "Chunk {} attempt {}/{}: provider call failed: {}",
                            chunk_index + 1,
                            attempt,
                            max_attempts,
                            provider_error
                        ),
                        other => warn!(
                            "Chunk {} attempt {}/{}: invalid response: {}",
                            chunk_index + 1,
                            attempt,
                            max_attempts,
                            other
                        ),
                    }
                    if attempt < max_attempts {
                        tokio::time::sleep(options.retry_backoff * attempt).await;
                    }
                }
            }
        }

        error!(
            "Chunk {} failed after {} attempts; keeping {} original lines marked {}",
            chunk_index + 1,
            max_attempts,
            chunk.len(),
            options.fallback_marker
        );
        fallback_results(chunk, &options.fallback_marker)
    }
}

/// Batch translator for processing a whole document in chunks
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(service: TranslationService) -> Self {
        Self { service }
    }

    /// Translate every line of `document` using `glossary` as a fixed override list.
    pub async fn translate(
        &self,
        document: &SubtitleDocument,
        glossary: &Glossary,
        program_context: &str,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Vec<TranslationResult>, TranslationError> {
        let translator = RetryingChunkTranslator::new(&self.service, glossary, program_context);
        self.translate_with(document, &translator, sink).await
    }

    /// Translate every line of `document` with a custom chunk translator.
    pub async fn translate_with(
        &self,
        document: &SubtitleDocument,
        translator: &dyn ChunkTranslator,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Vec<TranslationResult>, TranslationError> {
        let units = document.units();
        let options = &self.service.options;

        sink.translation_progress(0);
        if units.is_empty() {
            info!("Document has no text lines; nothing to translate");
            sink.translation_progress(100);
            return Ok(Vec::new());
        }

        let chunks = chunk_units(&units, options.chunk_size);
        let total_chunks = chunks.len();
        let completed = AtomicUsize::new(0);
        info!(
            "Translating {} lines in {} chunks ({} workers)",
            units.len(),
            total_chunks,
            options.max_concurrent_requests
        );

        let (completed, sink_ref) = (&completed, &sink);
        let per_chunk = run_worker_pool(chunks, options.max_concurrent_requests, move |index, chunk| {
            let sink = Arc::clone(sink_ref);
            async move {
                let results = translator.translate_chunk(index, chunk).await;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                sink.translation_progress(chunk_percentage(done, total_chunks));
                if let Some(block) = chunk.first().and_then(|u| document.block(u.block_index)) {
                    sink.current_block(Some(CurrentBlock {
                        block_id: block.id.clone(),
                        timestamp: block.timestamp.clone(),
                    }));
                }
                results
            }
        })
        .await;

        sink.current_block(None);

        let results: Vec<TranslationResult> = per_chunk.into_iter().flatten().collect();
        collect_results(results, units.len())
    }
}

/// Check the flattened results against the number of units sent.
pub fn collect_results(
    results: Vec<TranslationResult>,
    expected: usize,
) -> Result<Vec<TranslationResult>, TranslationError> {
    if results.len() != expected {
        error!(
            "Translated line count ({}) does not match the original ({})",
            results.len(),
            expected
        );
        return Err(TranslationError::Consistency {
            expected,
            actual: results.len(),
        });
    }
    Ok(results)
}
