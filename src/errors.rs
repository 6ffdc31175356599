/*!
 * Error types for the subgloss application.
 *
 * This module contains custom error types for the different layers of the
 * translation engine, using the thiserror crate for ergonomic error definitions.
 *
 * Per-chunk failures (`ChunkError`) are absorbed by the batch translator and
 * never reach the caller; phase-level failures (`TranslationError`) always do.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not complete within the configured time
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching provider error
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Map a reqwest transport error
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Configuration problems detected when a phase starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No API key in the config file nor in the provider's environment variable
    #[error("API key for {provider} is not set (add it to the config file or export {env_var})")]
    MissingCredential {
        /// Provider display name
        provider: String,
        /// Environment variable consulted as a fallback
        env_var: String,
    },

    /// A configuration value is out of range or unparseable
    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

/// Errors that can occur while segmenting subtitle input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// The input has no content after trimming
    #[error("Subtitle input is empty")]
    EmptyInput,

    /// A block has an id line but no timestamp line
    #[error("Subtitle block {block_id} has no timestamp line")]
    MissingTimestamp {
        /// Id line of the offending block
        block_id: String,
    },

    /// Two blocks share an id, which would make unit ids collide
    #[error("Subtitle block id {block_id} appears more than once")]
    DuplicateBlockId {
        /// The repeated id
        block_id: String,
    },
}

/// Failure of a single attempt to translate one chunk.
///
/// These are expected outcomes of talking to an LLM and are retried locally.
#[derive(Error, Debug, Clone)]
pub enum ChunkError {
    /// The provider call itself failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The response did not contain the expected JSON structure
    #[error("Response does not match the expected schema: {0}")]
    Schema(String),

    /// The response array has the wrong number of entries
    #[error("Response has {actual} lines but the chunk has {expected}")]
    CountMismatch {
        /// Units in the chunk
        expected: usize,
        /// Entries returned
        actual: usize,
    },

    /// The response references a unit that is not part of the chunk
    #[error("Response contains unknown uniqueId {0}")]
    UnknownId(String),

    /// The response translates the same unit twice
    #[error("Response contains uniqueId {0} more than once")]
    DuplicateId(String),
}

/// Errors that abort a whole phase (analysis or translation)
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Missing credential or invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the provider API during a single-shot call
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error with subtitle input
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// The number of translated units does not match the input
    #[error("Translated line count ({actual}) does not match the original ({expected})")]
    Consistency {
        /// Units sent for translation
        expected: usize,
        /// Results collected from all chunks
        actual: usize,
    },

    /// A unit has no translation at reassembly time
    #[error("No translation available for subtitle line {unique_id}")]
    Reassembly {
        /// Id of the missing unit
        unique_id: String,
    },

    /// The requested operation is not valid in the current phase
    #[error("Invalid phase transition: {0}")]
    Transition(#[from] crate::session::TransitionError),
}
