//! Provider abstractions for embeddings and answer generation
//!
//! Trait seams keep the pipeline testable with deterministic stubs and allow
//! swapping the upstream model provider without touching the orchestrator.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod retry;

pub use embedding::{EmbeddingProvider, EmbeddingTask};
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
