/*!
 * Per-phase session data.
 *
 * Each phase of a translation session is a struct holding exactly the data
 * that exists in that phase, so a translation cannot be started without a
 * parsed document and a finished session always has output text.
 */

use crate::subtitle_processor::SubtitleDocument;
use crate::translation::glossary::Glossary;

/// Waiting for the operator to describe the program
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingContext {
    /// Glossary the operator brought in before starting
    pub glossary: Glossary,
}

/// Program context accepted, waiting for a subtitle file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitingUpload {
    pub program_context: String,
    pub glossary: Glossary,
    pub established: Glossary,
    /// Why the previous analysis failed, if it did
    pub last_error: Option<String>,
}

/// Term extraction running over the uploaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analyzing {
    pub program_context: String,
    pub document: SubtitleDocument,
    pub glossary: Glossary,
    pub established: Glossary,
}

/// Glossary ready for operator review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reviewing {
    pub program_context: String,
    pub document: SubtitleDocument,
    pub glossary: Glossary,
    pub established: Glossary,
    /// Why the previous translation failed, if it did
    pub last_error: Option<String>,
}

/// Chunked translation running with a frozen glossary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translating {
    pub program_context: String,
    pub document: SubtitleDocument,
    pub glossary: Glossary,
    /// Snapshot taken when the translation started; used by every chunk
    pub established: Glossary,
}

/// Translation finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Done {
    pub program_context: String,
    pub document: SubtitleDocument,
    pub glossary: Glossary,
    pub established: Glossary,
    /// Reassembled SRT text
    pub output: String,
}
