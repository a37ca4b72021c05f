//! Error types for the retrieval-and-grounding pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid caller input (empty question, non-positive top-k, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream signalled a rate limit / exhausted quota. Transient: the
    /// retry loop consumes this variant and only surfaces it as
    /// [`Error::RateLimitExceeded`] once the attempt budget runs out.
    #[error("Rate limited by upstream: {0}")]
    RateLimited(String),

    /// Retry budget exhausted on a rate-limited call
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    /// Embedding provider failure (non-retryable)
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Generation provider failure (non-retryable)
    #[error("Answer generation failed: {0}")]
    Generation(String),

    /// Similarity index read/write failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Batch write aborted mid-way; rows persisted before the failure remain
    #[error("Batch write failed after {persisted} chunks persisted: {message}")]
    BatchWrite { persisted: usize, message: String },

    /// Batch embedding aborted mid-way; carries how far it got
    #[error("Embedding aborted after {embedded} of {total} chunks: {source}")]
    EmbeddingAborted {
        embedded: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Whether the retry loop may attempt this call again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}
