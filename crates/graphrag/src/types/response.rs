//! Structured outcomes returned to the pipeline's caller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::query::QueryResult;

/// Fallback answer text when retrieval returns nothing
pub const NO_RESULTS_ANSWER: &str =
    "I couldn't find any relevant information in the knowledge base to answer your question.";

/// The synthesized response to a question. Immutable after creation;
/// `sources` are ordered by ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Echo of the input question
    pub question: String,
    /// Generated natural-language answer
    pub text: String,
    /// Retrieval results the answer was grounded on, in ranking order
    pub sources: Vec<QueryResult>,
}

impl Answer {
    /// The canned answer for a query with zero retrieval hits. The
    /// synthesizer is never consulted in this case.
    pub fn no_results(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            text: NO_RESULTS_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Whether any chunks were stored
    pub success: bool,
    /// Human-readable summary for the caller to present
    pub message: String,
    /// Number of chunks embedded and stored
    pub chunks_processed: usize,
    /// Character statistics over the stored chunks
    pub stats: Option<super::chunk::ChunkStats>,
    /// When the run finished
    pub ingested_at: DateTime<Utc>,
}

impl IngestReport {
    /// Non-fatal outcome for an empty chunk list
    pub fn empty() -> Self {
        Self {
            success: false,
            message: "No chunks to process".to_string(),
            chunks_processed: 0,
            stats: None,
            ingested_at: Utc::now(),
        }
    }

    /// Non-fatal outcome when every supplied chunk was under the minimum
    /// length; distinct from a truly empty input
    pub fn all_below_minimum(total: usize, min_length: usize) -> Self {
        Self {
            success: false,
            message: format!("All {total} chunks below minimum length of {min_length} characters"),
            chunks_processed: 0,
            stats: None,
            ingested_at: Utc::now(),
        }
    }
}

/// Snapshot of the similarity index state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Total stored chunk count
    pub total_chunks: usize,
    /// Number of distinct source documents
    pub total_documents: usize,
    /// Distinct source names, lexicographically ordered
    pub documents: Vec<String>,
}
