//! Chunk types shared between ingestion and retrieval

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A unit of extracted text as supplied by the external chunk source
/// (PDF/text extractor). No embedding yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunk {
    /// Chunk text
    pub text: String,
    /// Originating document name (e.g. "report.pdf")
    pub source: String,
    /// Zero-based index within the source document
    pub position: usize,
    /// Opaque extractor metadata (length, extraction method, ...)
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SourceChunk {
    /// Deterministic chunk id: document stem plus positional index.
    /// Re-ingesting the same document yields the same ids, so storage
    /// upserts overwrite rather than duplicate.
    pub fn id(&self) -> String {
        let stem = match self.source.rsplit_once('.') {
            Some((stem, _ext)) if !stem.is_empty() => stem,
            _ => self.source.as_str(),
        };
        format!("{}_chunk_{}", stem, self.position)
    }
}

/// A retrievable chunk: text plus its embedding vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique id, derived from source name and position
    pub id: String,
    /// Chunk text
    pub text: String,
    /// Originating document name
    pub source: String,
    /// Zero-based index within the source document
    pub position: usize,
    /// Embedding vector; length must equal the configured dimensionality
    pub embedding: Vec<f32>,
    /// Opaque extractor metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Chunk {
    /// Pair a source chunk with its embedding
    pub fn from_source(source: SourceChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: source.id(),
            text: source.text,
            source: source.source,
            position: source.position,
            embedding,
            metadata: source.metadata,
        }
    }
}

/// Character-length statistics over a chunk set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub total_chars: usize,
    pub avg_chunk_size: f64,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

impl ChunkStats {
    /// Compute statistics from the chunks as they are about to be reported.
    /// Returns `None` for an empty set.
    pub fn compute(chunks: &[Chunk]) -> Option<Self> {
        if chunks.is_empty() {
            return None;
        }
        let lengths: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
        let total_chars: usize = lengths.iter().sum();
        Some(Self {
            total_chunks: chunks.len(),
            total_chars,
            avg_chunk_size: total_chars as f64 / chunks.len() as f64,
            min_chunk_size: *lengths.iter().min().unwrap_or(&0),
            max_chunk_size: *lengths.iter().max().unwrap_or(&0),
        })
    }
}
