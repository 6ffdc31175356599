/*!
 * Glossary extraction pass.
 *
 * One free-text call over the whole subtitle file asks the model for new
 * proper nouns and their translations. The answer is parsed as a glossary
 * list and merged over the operator's editable glossary.
 */

use log::{error, info};
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::subtitle_processor::SubtitleDocument;

use super::core::TranslationService;
use super::glossary::Glossary;
use super::progress::{analysis_time_constant, ProgressSink, ProgressTicker};
use super::prompts::build_analysis_request;

/// Inputs of one extraction pass
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    /// Operator-written introduction of the program
    pub program_context: &'a str,

    /// Glossary frozen by the previous translation run; sent as context only
    pub established: &'a Glossary,

    /// Editable glossary the suggestions are merged into
    pub current: &'a Glossary,

    /// The parsed subtitle file
    pub document: &'a SubtitleDocument,
}

/// Runs the extraction call and reports simulated progress
#[derive(Debug, Clone, Default)]
pub struct TermExtractor;

impl TermExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract terms and return `current` merged with the suggestions.
    ///
    /// Progress is 0 at the start, then simulated, then 100 on success. On
    /// failure progress returns to 0 and the error is returned; the inputs are
    /// never modified.
    pub async fn extract(
        &self,
        service: &TranslationService,
        request: AnalysisRequest<'_>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Glossary, TranslationError> {
        sink.analysis_progress(0);

        let subtitle_text = request.document.to_srt_string();
        let tau = analysis_time_constant(request.document.source_chars());
        let prompt = build_analysis_request(
            &service.languages,
            request.program_context,
            request.established,
            &subtitle_text,
        );

        info!(
            "Analyzing {} subtitle blocks for terminology with {}",
            request.document.len(),
            service.provider_name()
        );

        let ticker = ProgressTicker::start(service.options.analysis_tick, tau, Arc::clone(&sink));
        let result = service.complete(prompt).await;
        ticker.stop().await;

        match result {
            Ok(raw) => {
                let suggestions = Glossary::parse(raw.trim());
                let merged = request.current.merge(&suggestions);
                info!(
                    "Terminology analysis suggested {} terms ({} in glossary)",
                    suggestions.len(),
                    merged.len()
                );
                sink.analysis_progress(100);
                Ok(merged)
            }
            Err(e) => {
                error!("Terminology analysis failed: {}", e);
                sink.analysis_progress(0);
                Err(TranslationError::Provider(e))
            }
        }
    }
}
