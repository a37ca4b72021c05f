//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Embedding mode: corpus documents and search queries use differently tuned
/// request parameters but the same model and dimensionality, so the vectors
/// stay comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Indexing a corpus document
    Document,
    /// Encoding a search query
    Query,
}

/// Trait for converting text into fixed-length vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for `text`. Empty text is rejected upstream of
    /// the network call.
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>>;

    /// Embedding dimensionality this provider produces
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
