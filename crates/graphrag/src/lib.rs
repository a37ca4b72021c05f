//! graphrag: retrieval-augmented generation over a SQLite similarity index
//!
//! Pre-extracted document chunks are embedded through the Gemini API, stored
//! with their vectors, and retrieved by cosine similarity to ground answer
//! generation. The extraction front end and any UI live outside this crate;
//! callers hand in [`types::SourceChunk`] lists and receive structured
//! reports and answers back.

pub mod config;
pub mod error;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod providers;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use index::SimilarityIndex;
pub use pipeline::RagPipeline;
pub use providers::{EmbeddingProvider, EmbeddingTask, GeminiClient, LlmProvider};
pub use types::{Answer, Chunk, IndexInfo, IngestReport, QueryResult, SourceChunk};
