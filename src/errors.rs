/*!
 * Error types for the xmltl application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a translation service
#[derive(Error, Debug)]
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
        /// HTTP or service status code
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
}

/// Errors that can occur while loading the input document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The input file could not be read
    #[error("Failed to read document {path}: {source}")]
    Read {
        /// Path of the document
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The document is not well-formed
    #[error("Failed to parse document: {0}")]
    Parse(String),

    /// A record element lacks one of its required attributes
    #[error("Element <{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        /// Element name
        element: String,
        /// Attribute name
        attribute: String,
    },
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The service returned a different number of lines than were sent
    #[error("Line count mismatch: sent {expected} lines, received {actual}")]
    LineCountMismatch {
        /// Lines sent
        expected: usize,
        /// Lines received
        actual: usize,
    },

    /// Retry limit reached without a successful response
    #[error("Translation stalled after {attempts} consecutive failures: {last_error}")]
    Stalled {
        /// Number of consecutive failed attempts
        attempts: u32,
        /// Last error observed
        last_error: String,
    },
}

/// Errors that can occur while reading or writing checkpoint state
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// Filesystem failure
    #[error("Checkpoint IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The sidecar file exists but cannot be understood
    #[error("Malformed checkpoint: {0}")]
    Malformed(String),
}

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document could not be loaded
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// A batch could not be translated
    #[error("Batch {batch} failed: {source}")]
    Batch {
        /// Zero-based batch index
        batch: usize,
        /// Cause
        #[source]
        source: TranslationError,
    },

    /// Checkpoint state could not be persisted
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Output could not be written
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TranslationError {
    /// Whether a per-record retry can recover from this error
    pub fn is_line_mismatch(&self) -> bool {
        matches!(self, Self::LineCountMismatch { .. })
    }
}
