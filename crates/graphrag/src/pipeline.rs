//! Pipeline orchestration: ingestion and query paths
//!
//! Each call is one independent unit of work; no session state survives it.
//! Components are injected behind trait objects so the pipeline itself never
//! touches the network.

use futures::StreamExt;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::index::SimilarityIndex;
use crate::providers::{EmbeddingProvider, EmbeddingTask, GeminiClient, LlmProvider};
use crate::types::{Answer, Chunk, ChunkStats, IndexInfo, IngestReport, SourceChunk};

/// Orchestrates chunk ingestion and grounded question answering
pub struct RagPipeline {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    index: Arc<SimilarityIndex>,
}

impl RagPipeline {
    /// Compose a pipeline from explicit components
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: Arc<SimilarityIndex>,
    ) -> Self {
        Self {
            config,
            embedder,
            llm,
            index,
        }
    }

    /// Build the production pipeline: Gemini providers plus the on-disk index
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
        let index = Arc::new(SimilarityIndex::open(
            &config.storage.path,
            config.gemini.dimensions,
        )?);
        Ok(Self::new(config, gemini.clone(), gemini, index))
    }

    /// Ingestion path: chunks -> embeddings -> batch store -> report.
    ///
    /// An empty chunk list is a non-fatal outcome, not an error. Chunks
    /// shorter than the configured minimum are dropped with a warning.
    /// Embedding failures abort the run; the log carries how many chunks
    /// were embedded before the failure.
    pub async fn ingest(&self, chunks: Vec<SourceChunk>) -> Result<IngestReport> {
        if chunks.is_empty() {
            tracing::warn!("ingest called with no chunks");
            return Ok(IngestReport::empty());
        }

        let min_length = self.config.retrieval.min_chunk_length;
        let total = chunks.len();
        let chunks: Vec<SourceChunk> = chunks
            .into_iter()
            .filter(|c| {
                let keep = c.text.chars().count() >= min_length;
                if !keep {
                    tracing::warn!(id = %c.id(), min_length, "dropping under-minimum chunk");
                }
                keep
            })
            .collect();

        if chunks.is_empty() {
            tracing::warn!(total, min_length, "all chunks below minimum length");
            return Ok(IngestReport::all_below_minimum(total, min_length));
        }

        tracing::info!(count = chunks.len(), "embedding chunks");
        let embedded = self.embed_batch(chunks).await?;

        let index = Arc::clone(&self.index);
        let (embedded, persisted) = tokio::task::spawn_blocking(move || {
            let persisted = index.store_batch(&embedded)?;
            Ok::<_, Error>((embedded, persisted))
        })
        .await
        .map_err(|e| Error::storage(format!("task join error: {e}")))??;

        // Stats are recomputed from the stored set right before the report
        // is built, never carried over from an earlier pipeline stage.
        let stats = ChunkStats::compute(&embedded);

        tracing::info!(persisted, "ingestion complete");
        Ok(IngestReport {
            success: true,
            message: format!("Successfully processed {persisted} chunks"),
            chunks_processed: persisted,
            stats,
            ingested_at: chrono::Utc::now(),
        })
    }

    /// Embed chunks with a bounded worker pool. Each request is paired with
    /// its chunk, so completion order cannot scramble the association.
    async fn embed_batch(&self, chunks: Vec<SourceChunk>) -> Result<Vec<Chunk>> {
        let concurrency = self.config.retrieval.embed_concurrency.max(1);
        let total = chunks.len();

        let mut stream = futures::stream::iter(chunks.into_iter().map(|chunk| {
            let embedder = Arc::clone(&self.embedder);
            async move {
                let vector = embedder.embed(&chunk.text, EmbeddingTask::Document).await?;
                Ok::<Chunk, Error>(Chunk::from_source(chunk, vector))
            }
        }))
        .buffered(concurrency);

        let mut embedded = Vec::with_capacity(total);
        while let Some(result) = stream.next().await {
            match result {
                Ok(chunk) => {
                    embedded.push(chunk);
                    if embedded.len() % 10 == 0 {
                        tracing::debug!(progress = embedded.len(), total, "embedding progress");
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        embedded = embedded.len(),
                        total,
                        "embedding failed, aborting ingestion: {err}"
                    );
                    return Err(Error::EmbeddingAborted {
                        embedded: embedded.len(),
                        total,
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(embedded)
    }

    /// Query path: question -> query embedding -> top-K retrieval ->
    /// grounded synthesis. Zero retrieval hits short-circuit to the canned
    /// fallback answer without consulting the synthesizer.
    pub async fn query(&self, question: &str, top_k: Option<usize>) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::validation("question must not be empty"));
        }
        let top_k = match top_k {
            Some(0) => return Err(Error::validation("top_k must be a positive integer")),
            Some(k) => k,
            None => self.config.retrieval.top_k,
        };

        tracing::info!(top_k, "processing query");
        let query_vector = self.embedder.embed(question, EmbeddingTask::Query).await?;

        let index = Arc::clone(&self.index);
        let results = tokio::task::spawn_blocking(move || index.search_top_k(&query_vector, top_k))
            .await
            .map_err(|e| Error::storage(format!("task join error: {e}")))??;

        if results.is_empty() {
            tracing::info!("no relevant chunks found, skipping synthesis");
            return Ok(Answer::no_results(question));
        }

        tracing::debug!(retrieved = results.len(), "building grounding context");
        let (_context, prompt) = PromptBuilder::build(question, &results);
        let text = self.llm.generate(&prompt).await?;

        Ok(Answer {
            question: question.to_string(),
            text,
            sources: results,
        })
    }

    /// Snapshot of the index: chunk count and known documents
    pub fn info(&self) -> Result<IndexInfo> {
        let documents = self.index.list_sources()?;
        Ok(IndexInfo {
            total_chunks: self.index.count()?,
            total_documents: documents.len(),
            documents,
        })
    }

    /// Remove every chunk of one document; returns the number removed
    pub fn delete_document(&self, source: &str) -> Result<usize> {
        self.index.delete_by_source(source)
    }
}
