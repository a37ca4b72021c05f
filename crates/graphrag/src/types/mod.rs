//! Core types for the retrieval-and-grounding pipeline

pub mod chunk;
pub mod query;
pub mod response;

pub use chunk::{Chunk, ChunkStats, SourceChunk};
pub use query::{QueryResult, RetrievedChunk};
pub use response::{Answer, IndexInfo, IngestReport};
