//! Retrieval result types

use serde::{Deserialize, Serialize};

/// Value copy of the stored chunk fields a caller needs to display a source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub position: usize,
}

/// A ranked retrieval outcome, transient to one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The retrieved chunk
    pub chunk: RetrievedChunk,
    /// Cosine similarity to the query vector; higher is more relevant
    pub similarity: f64,
}
