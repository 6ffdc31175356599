/*!
 * Prompt engineering for subtitle translation.
 *
 * This module provides:
 * - System prompt templates for extraction and translation
 * - Request builders for both phases
 * - The chunk response schema and its serde types
 */

pub mod templates;

// Re-export main types
pub use templates::{
    build_analysis_request, build_chunk_request, extract_chunk_payload, extract_json,
    response_schema, ChunkPayload, PromptLanguages, PromptTemplate, TranslatedLinesResponse,
    TranslationResult,
};
