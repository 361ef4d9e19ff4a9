//! Error types for the affirmation service
//!
//! Only [`Error::Unavailable`] is meant to reach a caller of
//! [`AffirmationService`](crate::AffirmationService). Source failures are
//! absorbed by the aggregator and an empty refresh is reported as a
//! [`RefreshOutcome`](crate::cache::RefreshOutcome), not as an error.

use thiserror::Error;

/// Result type alias for affirmation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the affirmation service
#[derive(Error, Debug)]
pub enum Error {
    /// A single topic could not be fetched or parsed
    #[error("Source unavailable for topic '{topic}': {message}")]
    SourceUnavailable {
        /// Topic that failed
        topic: String,
        /// Underlying cause
        message: String,
    },

    /// The serving snapshot holds no items
    #[error("No affirmations available right now, try again soon")]
    Unavailable,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors (config loading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a source-unavailable error for one topic
    pub fn source_unavailable(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error should be shown to an end user as "try again later"
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}
