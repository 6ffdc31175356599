/*!
 * # subgloss - glossary-consistent subtitle translation with LLMs
 *
 * A Rust library for translating SRT subtitle files line by line through a
 * large language model while keeping terminology consistent across the
 * whole file.
 *
 * ## Features
 *
 * - Terminology extraction pass producing an editable glossary
 * - Chunked translation through a bounded worker pool, with per-chunk retry
 *   and a marked fallback for chunks that keep failing
 * - Strict response validation (line count and ids) and exact block framing
 * - Providers:
 *   - Gemini API
 *   - OpenAI API
 *   - Anthropic API
 *   - Ollama (local LLM)
 * - Monotonic progress reporting for both phases
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `subtitle_processor`: SRT segmentation into blocks and translation units
 * - `translation`: The orchestration engine:
 *   - `translation::glossary`: Term list and exchange format
 *   - `translation::analysis`: Terminology extraction
 *   - `translation::batch`: Chunked translation worker pool
 *   - `translation::reassembly`: SRT output
 *   - `translation::progress`: Progress sinks and simulated progress
 * - `session`: Phase state machine of one translation session
 * - `app_controller`: Drives a session and renders terminal progress
 * - `app_config`: Configuration management
 * - `providers`: Client implementations for the supported LLM APIs
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod session;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{ConsoleProgress, Controller};
pub use errors::{ChunkError, ConfigError, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use session::{Event, Phase, TransitionError};
pub use subtitle_processor::{SubtitleBlock, SubtitleDocument, TranslationUnit};
pub use translation::{Glossary, TranslationService};
