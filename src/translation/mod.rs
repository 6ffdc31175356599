/*!
 * Translation orchestration engine.
 *
 * This module contains the two LLM-backed phases and everything they share.
 * It is split into several submodules:
 *
 * - `core`: Translation service (provider, options, per-call timeout)
 * - `glossary`: Ordered term list and its text exchange format
 * - `prompts`: Prompt templates, request builders and the response schema
 * - `progress`: Progress sinks and the simulated analysis ticker
 * - `analysis`: Glossary extraction pass
 * - `batch`: Chunked translation through a bounded worker pool
 * - `reassembly`: Rebuilding SRT text from translated lines
 */

// Re-export main types for easier usage
pub use self::analysis::{AnalysisRequest, TermExtractor};
pub use self::batch::{BatchTranslator, ChunkTranslator, RetryingChunkTranslator};
pub use self::core::{TranslationOptions, TranslationService};
pub use self::glossary::Glossary;
pub use self::progress::{CurrentBlock, NoopProgress, ProgressSink, ProgressTracker};
pub use self::reassembly::{normalize_line, Reassembler};

// Re-export prompt types
pub use self::prompts::{PromptLanguages, PromptTemplate, TranslationResult};

// Submodules
pub mod analysis;
pub mod batch;
pub mod core;
pub mod glossary;
pub mod progress;
pub mod prompts;
pub mod reassembly;
