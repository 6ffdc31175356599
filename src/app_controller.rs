use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info, warn};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::{ConfigError, TranslationError};
use crate::providers::Provider;
use crate::session::{Analyzing, Event, Phase, Translating, TransitionError};
use crate::subtitle_processor::SubtitleDocument;
use crate::translation::prompts::PromptLanguages;
use crate::translation::{
    AnalysisRequest, BatchTranslator, CurrentBlock, Glossary, ProgressSink, Reassembler, TermExtractor,
    TranslationOptions, TranslationService,
};

// @module: Application controller driving one translation session

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Current session phase
    phase: Phase,

    // @field: Receiver of progress updates
    sink: Arc<dyn ProgressSink>,

    // @field: Provider used instead of the configured one
    provider: Option<Arc<dyn Provider>>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn new(config: Config, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            config,
            phase: Phase::default(),
            sink,
            provider: None,
        }
    }

    /// Use `provider` for every phase instead of building one from the configuration
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Current phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accept the program introduction and move on to the upload step
    pub fn submit_context(&mut self, program_context: &str) -> Result<(), TranslationError> {
        self.transition(Event::ContextSubmitted(program_context.to_string()))
    }

    /// Parse an uploaded subtitle file and enter the analysis phase.
    ///
    /// Malformed input leaves the session waiting for another upload.
    pub fn upload(&mut self, text: &str) -> Result<(), TranslationError> {
        if !matches!(self.phase, Phase::AwaitingUpload(_)) {
            return Err(self.not_allowed("SubtitleUploaded").into());
        }
        let document = SubtitleDocument::parse(text).map_err(|e| {
            warn!("Rejected subtitle upload: {}", e);
            e
        })?;
        info!(
            "Loaded {} subtitle blocks ({} lines)",
            document.len(),
            document.unit_count()
        );
        self.transition(Event::SubtitleUploaded(document))
    }

    /// Run term extraction and move to review with the merged glossary.
    ///
    /// On failure the session returns to the upload step.
    pub async fn analyze(&mut self) -> Result<Glossary, TranslationError> {
        self.analyzing("analyze")?;
        self.sink.analysis_progress(0);

        let service = match self.service() {
            Ok(service) => service,
            Err(e) => {
                error!("Cannot start analysis: {}", e);
                self.transition(Event::AnalysisFailed(e.to_string()))?;
                return Err(e.into());
            }
        };

        let state = self.analyzing("analyze")?;
        let result = TermExtractor::new()
            .extract(
                &service,
                AnalysisRequest {
                    program_context: &state.program_context,
                    established: &state.established,
                    current: &state.glossary,
                    document: &state.document,
                },
                Arc::clone(&self.sink),
            )
            .await;

        match result {
            Ok(glossary) => {
                self.transition(Event::AnalysisSucceeded(glossary.clone()))?;
                Ok(glossary)
            }
            Err(e) => {
                self.transition(Event::AnalysisFailed(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Replace the editable glossary
    pub fn edit_glossary(&mut self, glossary: Glossary) -> Result<(), TranslationError> {
        self.transition(Event::GlossaryEdited(glossary))
    }

    /// Freeze the glossary, translate every line and reassemble the file.
    ///
    /// On failure the session returns to review with the glossary intact.
    pub async fn translate(&mut self) -> Result<String, TranslationError> {
        self.transition(Event::TranslationStarted)?;
        self.sink.translation_progress(0);
        self.sink.current_block(None);

        let service = match self.service() {
            Ok(service) => service,
            Err(e) => {
                error!("Cannot start translation: {}", e);
                self.transition(Event::TranslationFailed(e.to_string()))?;
                return Err(e.into());
            }
        };

        info!(
            "🚀 subgloss: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );

        let state = self.translating("translate")?;
        let translator = BatchTranslator::new(service);
        let outcome = async {
            let results = translator
                .translate(
                    &state.document,
                    &state.established,
                    &state.program_context,
                    Arc::clone(&self.sink),
                )
                .await?;
            Reassembler::new().reassemble(&state.document, &results)
        }
        .await;

        match outcome {
            Ok(output) => {
                self.transition(Event::TranslationSucceeded(output.clone()))?;
                Ok(output)
            }
            Err(e) => {
                error!("Translation failed: {}", e);
                self.transition(Event::TranslationFailed(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Drop everything and start over
    pub fn reset(&mut self) {
        self.phase = Phase::default();
        self.sink.analysis_progress(0);
        self.sink.translation_progress(0);
        self.sink.current_block(None);
    }

    fn transition(&mut self, event: Event) -> Result<(), TranslationError> {
        let next = self.phase.clone().apply(event)?;
        self.phase = next;
        Ok(())
    }

    fn not_allowed(&self, event: &'static str) -> TransitionError {
        TransitionError::NotAllowed {
            phase: self.phase.name(),
            event,
        }
    }

    fn analyzing(&self, operation: &'static str) -> Result<&Analyzing, TransitionError> {
        match &self.phase {
            Phase::Analyzing(state) => Ok(state),
            _ => Err(self.not_allowed(operation)),
        }
    }

    fn translating(&self, operation: &'static str) -> Result<&Translating, TransitionError> {
        match &self.phase {
            Phase::Translating(state) => Ok(state),
            _ => Err(self.not_allowed(operation)),
        }
    }

    // Built per phase so a credential added between phases is picked up
    fn service(&self) -> Result<TranslationService, ConfigError> {
        match &self.provider {
            Some(provider) => Ok(TranslationService::with_provider(
                Arc::clone(provider),
                TranslationOptions::from_config(&self.config),
                PromptLanguages::new(
                    self.config.source_language_label(),
                    self.config.target_language_label(),
                ),
            )),
            None => TranslationService::new(&self.config),
        }
    }
}

/// Terminal progress display with one bar per phase
pub struct ConsoleProgress {
    analysis: ProgressBar,
    translation: ProgressBar,
}

impl ConsoleProgress {
    /// Bars drawn on stderr
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Bars that are never drawn
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let multi_progress = MultiProgress::with_draw_target(target);
        let analysis = multi_progress.add(Self::bar("Analyzing terms"));
        let translation = multi_progress.add(Self::bar("Translating"));
        Self { analysis, translation }
    }

    fn bar(message: &'static str) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(100);
        bar.set_style(style.progress_chars("█▓▒░"));
        bar.set_message(message);
        bar
    }

    /// Current analysis position
    pub fn analysis_position(&self) -> u64 {
        self.analysis.position()
    }

    /// Current translation position
    pub fn translation_position(&self) -> u64 {
        self.translation.position()
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn analysis_progress(&self, percent: u8) {
        self.analysis.set_position(u64::from(percent));
        if percent >= 100 {
            self.analysis.finish_with_message("Terms analyzed");
        }
    }

    fn translation_progress(&self, percent: u8) {
        self.translation.set_position(u64::from(percent));
        if percent >= 100 {
            self.translation.finish_with_message("Translated");
        }
    }

    fn current_block(&self, block: Option<CurrentBlock>) {
        match block {
            Some(block) => self
                .translation
                .set_message(format!("#{} {}", block.block_id, block.timestamp)),
            None => self.translation.set_message(""),
        }
    }
}
