//! Configuration for the retrieval-and-grounding pipeline
//!
//! Only the values are specified here; how they are loaded (env file, TOML,
//! flags) is the caller's concern. `from_env` covers the common case.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Gemini provider configuration (embeddings + generation)
    pub gemini: GeminiConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Similarity index storage configuration
    pub storage: StorageConfig,
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key (required for live calls)
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Embedding dimensionality; every stored vector must match it
    pub dimensions: usize,
    /// Generation model name
    pub generate_model: String,
    /// Generation temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Total attempt budget for rate-limited calls
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            embed_model: "gemini-embedding-001".to_string(),
            dimensions: 768,
            generate_model: "gemini-2.5-flash-lite".to_string(),
            temperature: 0.3,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum chunk length in characters; shorter chunks are dropped
    pub min_chunk_length: usize,
    /// Default number of results to retrieve
    pub top_k: usize,
    /// Concurrent embedding requests during batch ingestion
    pub embed_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_chunk_length: 20,
            top_k: 5,
            embed_concurrency: 4,
        }
    }
}

/// Similarity index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database path
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("graphrag.db"),
        }
    }
}

impl RagConfig {
    /// Build a configuration from environment variables, using defaults for
    /// anything unset. `GEMINI_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.gemini.api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::validation("GEMINI_API_KEY not set"))?;

        if let Ok(model) = std::env::var("GEMINI_EMBEDDING_MODEL") {
            config.gemini.embed_model = model;
        }
        if let Ok(dims) = std::env::var("GEMINI_EMBEDDING_DIMENSIONS") {
            config.gemini.dimensions = dims
                .parse()
                .map_err(|_| Error::validation("GEMINI_EMBEDDING_DIMENSIONS must be an integer"))?;
        }
        if let Ok(model) = std::env::var("GEMINI_GENERATION_MODEL") {
            config.gemini.generate_model = model;
        }
        if let Ok(path) = std::env::var("GRAPHRAG_DB_PATH") {
            config.storage.path = PathBuf::from(path);
        }

        Ok(config)
    }
}
