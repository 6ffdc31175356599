/*!
 * Session phase transitions.
 *
 * `Phase::apply` is a pure function from (phase, event) to the next phase.
 * Callers keep their current phase when it returns an error.
 */

use thiserror::Error;

use crate::subtitle_processor::SubtitleDocument;
use crate::translation::glossary::Glossary;

use super::models::{Analyzing, AwaitingUpload, CollectingContext, Done, Reviewing, Translating};

/// Phase of a translation session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    CollectingContext(CollectingContext),
    AwaitingUpload(AwaitingUpload),
    Analyzing(Analyzing),
    Reviewing(Reviewing),
    Translating(Translating),
    Done(Done),
}

/// Something that happened to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Operator described the program
    ContextSubmitted(String),
    /// A subtitle file was parsed
    SubtitleUploaded(SubtitleDocument),
    /// Term extraction returned the merged glossary
    AnalysisSucceeded(Glossary),
    /// Term extraction failed with this message
    AnalysisFailed(String),
    /// Operator replaced the editable glossary
    GlossaryEdited(Glossary),
    TranslationStarted,
    /// Translation finished with this SRT text
    TranslationSucceeded(String),
    /// Translation failed with this message
    TranslationFailed(String),
    Reset,
}

impl Event {
    /// Short name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::ContextSubmitted(_) => "ContextSubmitted",
            Event::SubtitleUploaded(_) => "SubtitleUploaded",
            Event::AnalysisSucceeded(_) => "AnalysisSucceeded",
            Event::AnalysisFailed(_) => "AnalysisFailed",
            Event::GlossaryEdited(_) => "GlossaryEdited",
            Event::TranslationStarted => "TranslationStarted",
            Event::TranslationSucceeded(_) => "TranslationSucceeded",
            Event::TranslationFailed(_) => "TranslationFailed",
            Event::Reset => "Reset",
        }
    }
}

/// Rejected phase transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The program context was empty or whitespace
    #[error("Program context must not be empty")]
    EmptyContext,

    /// The event is not accepted in the current phase
    #[error("{event} is not allowed while {phase}")]
    NotAllowed {
        /// Phase the session was in
        phase: &'static str,
        /// Event that was rejected
        event: &'static str,
    },
}

impl Default for Phase {
    fn default() -> Self {
        Phase::CollectingContext(CollectingContext::default())
    }
}

impl Phase {
    /// Short name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            Phase::CollectingContext(_) => "CollectingContext",
            Phase::AwaitingUpload(_) => "AwaitingUpload",
            Phase::Analyzing(_) => "Analyzing",
            Phase::Reviewing(_) => "Reviewing",
            Phase::Translating(_) => "Translating",
            Phase::Done(_) => "Done",
        }
    }

    /// The editable glossary of this phase
    pub fn glossary(&self) -> &Glossary {
        match self {
            Phase::CollectingContext(s) => &s.glossary,
            Phase::AwaitingUpload(s) => &s.glossary,
            Phase::Analyzing(s) => &s.glossary,
            Phase::Reviewing(s) => &s.glossary,
            Phase::Translating(s) => &s.glossary,
            Phase::Done(s) => &s.glossary,
        }
    }

    /// Error message left by the last failed phase, if any
    pub fn last_error(&self) -> Option<&str> {
        match self {
            Phase::AwaitingUpload(s) => s.last_error.as_deref(),
            Phase::Reviewing(s) => s.last_error.as_deref(),
            _ => None,
        }
    }

    /// Compute the phase that follows `event`.
    pub fn apply(self, event: Event) -> Result<Phase, TransitionError> {
        let phase_name = self.name();
        let event_name = event.name();

        match (self, event) {
            (_, Event::Reset) => Ok(Phase::default()),

            (Phase::CollectingContext(state), Event::ContextSubmitted(context)) => {
                let program_context = context.trim();
                if program_context.is_empty() {
                    return Err(TransitionError::EmptyContext);
                }
                Ok(Phase::AwaitingUpload(AwaitingUpload {
                    program_context: program_context.to_string(),
                    glossary: state.glossary,
                    established: Glossary::new(),
                    last_error: None,
                }))
            }

            (Phase::CollectingContext(_), Event::GlossaryEdited(glossary)) => {
                Ok(Phase::CollectingContext(CollectingContext { glossary }))
            }

            (Phase::AwaitingUpload(state), Event::GlossaryEdited(glossary)) => {
                Ok(Phase::AwaitingUpload(AwaitingUpload { glossary, ..state }))
            }

            (Phase::AwaitingUpload(state), Event::SubtitleUploaded(document)) => Ok(Phase::Analyzing(Analyzing {
                program_context: state.program_context,
                document,
                glossary: state.glossary,
                established: state.established,
            })),

            (Phase::Analyzing(state), Event::AnalysisSucceeded(glossary)) => Ok(Phase::Reviewing(Reviewing {
                program_context: state.program_context,
                document: state.document,
                glossary,
                established: state.established,
                last_error: None,
            })),

            (Phase::Analyzing(state), Event::AnalysisFailed(message)) => Ok(Phase::AwaitingUpload(AwaitingUpload {
                program_context: state.program_context,
                glossary: state.glossary,
                established: state.established,
                last_error: Some(message),
            })),

            (Phase::Reviewing(state), Event::GlossaryEdited(glossary)) => {
                Ok(Phase::Reviewing(Reviewing { glossary, ..state }))
            }

            (Phase::Reviewing(state), Event::TranslationStarted) => Ok(Phase::Translating(Translating {
                program_context: state.program_context,
                document: state.document,
                established: state.glossary.clone(),
                glossary: state.glossary,
            })),

            (Phase::Translating(state), Event::TranslationSucceeded(output)) => Ok(Phase::Done(Done {
                program_context: state.program_context,
                document: state.document,
                glossary: state.glossary,
                established: state.established,
                output,
            })),

            (Phase::Translating(state), Event::TranslationFailed(message)) => Ok(Phase::Reviewing(Reviewing {
                program_context: state.program_context,
                document: state.document,
                glossary: state.glossary,
                established: state.established,
                last_error: Some(message),
            })),

            _ => Err(TransitionError::NotAllowed {
                phase: phase_name,
                event: event_name,
            }),
        }
    }
}
