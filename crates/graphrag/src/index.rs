//! SQLite-backed similarity index
//!
//! Chunks are persisted with their embeddings and ranked by cosine
//! similarity with a brute-force scan. Vectors are stored raw; magnitudes
//! are divided out at query time, so provider output does not have to be
//! pre-normalized. Scores are computed in f64.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Chunk, QueryResult, RetrievedChunk};

/// Persistent chunk store answering top-K cosine similarity queries
pub struct SimilarityIndex {
    conn: Arc<Mutex<Connection>>,
    dimensions: usize,
}

impl SimilarityIndex {
    /// Create or open the index at the given path
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("failed to open database: {e}")))?;
        Self::from_connection(conn, dimensions)
    }

    /// Create an in-memory index (for testing)
    #[cfg(test)]
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("failed to open in-memory database: {e}")))?;
        Self::from_connection(conn, dimensions)
    }

    fn from_connection(conn: Connection, dimensions: usize) -> Result<Self> {
        let index = Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        };
        index.migrate()?;
        Ok(index)
    }

    /// Idempotent schema bootstrap. The uniqueness constraint on `id` is
    /// part of the table definition; the source lookup index is an optional
    /// acceleration and its absence only degrades speed.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::storage(format!("failed to set pragmas: {e}")))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                source TEXT NOT NULL,
                position INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}'
            );
        "#,
        )
        .map_err(|e| Error::storage(format!("failed to create schema: {e}")))?;

        if let Err(e) = conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);",
        ) {
            tracing::warn!("source index unavailable, falling back to full scans: {e}");
        }

        Ok(())
    }

    /// Upsert a batch of chunks by id. Not atomic across the batch: on a
    /// mid-batch failure the rows already written remain and the error
    /// carries the persisted count.
    pub fn store_batch(&self, chunks: &[Chunk]) -> Result<usize> {
        let conn = self.conn.lock();
        let mut persisted = 0usize;

        for chunk in chunks {
            self.upsert(&conn, chunk).map_err(|e| Error::BatchWrite {
                persisted,
                message: e.to_string(),
            })?;
            persisted += 1;
        }

        tracing::debug!(count = persisted, "stored chunk batch");
        Ok(persisted)
    }

    fn upsert(&self, conn: &Connection, chunk: &Chunk) -> Result<()> {
        if chunk.embedding.len() != self.dimensions {
            return Err(Error::storage(format!(
                "chunk '{}' has {} dimensions, index expects {}",
                chunk.id,
                chunk.embedding.len(),
                self.dimensions
            )));
        }

        let metadata = serde_json::to_string(&chunk.metadata)?;

        // ON CONFLICT DO UPDATE keeps the original rowid, so a re-ingested
        // chunk retains its insertion-order rank for tie-breaking.
        conn.execute(
            r#"
            INSERT INTO chunks (id, text, source, position, embedding, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                text = excluded.text,
                source = excluded.source,
                position = excluded.position,
                embedding = excluded.embedding,
                metadata = excluded.metadata
        "#,
            params![
                chunk.id,
                chunk.text,
                chunk.source,
                chunk.position as i64,
                embedding_to_blob(&chunk.embedding),
                metadata,
            ],
        )
        .map_err(|e| Error::storage(format!("failed to persist chunk '{}': {e}", chunk.id)))?;

        Ok(())
    }

    /// Rank all stored chunks by cosine similarity to `query_vector`,
    /// descending, ties broken by insertion order. Returns at most `k`
    /// results; an empty store yields an empty vec.
    pub fn search_top_k(&self, query_vector: &[f32], k: usize) -> Result<Vec<QueryResult>> {
        if query_vector.len() != self.dimensions {
            return Err(Error::storage(format!(
                "query vector has {} dimensions, index expects {}",
                query_vector.len(),
                self.dimensions
            )));
        }

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, text, source, position, embedding FROM chunks ORDER BY rowid ASC",
            )
            .map_err(|e| Error::storage(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                ))
            })
            .map_err(|e| Error::storage(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            let (id, text, source, position, blob) = row.map_err(|e| Error::storage(e.to_string()))?;
            let embedding = blob_to_embedding(&blob)?;
            let similarity = cosine_similarity(query_vector, &embedding);
            results.push(QueryResult {
                chunk: RetrievedChunk {
                    id,
                    text,
                    source,
                    position: position as usize,
                },
                similarity,
            });
        }

        // Stable sort over rows in insertion order: equal scores keep the
        // earlier-inserted chunk first.
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        Ok(results)
    }

    /// Distinct source names, lexicographically ordered
    pub fn list_sources(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT DISTINCT source FROM chunks ORDER BY source ASC")
            .map_err(|e| Error::storage(e.to_string()))?;

        let sources = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::storage(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::storage(e.to_string()))?;

        Ok(sources)
    }

    /// Total stored chunk count
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| Error::storage(e.to_string()))?;
        Ok(count as usize)
    }

    /// Delete every chunk from `source`, returning the number removed.
    /// An unknown source is not an error and returns 0.
    pub fn delete_by_source(&self, source: &str) -> Result<usize> {
        let conn = self.conn.lock();
        let deleted = conn
            .execute("DELETE FROM chunks WHERE source = ?1", params![source])
            .map_err(|e| Error::storage(e.to_string()))?;
        tracing::debug!(source, deleted, "deleted chunks by source");
        Ok(deleted)
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::storage("corrupt embedding blob"));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Cosine similarity in f64. Zero-magnitude vectors score 0.0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn chunk(id: &str, source: &str, position: usize, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text of {id}"),
            source: source.to_string(),
            position,
            embedding,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn cosine_of_identical_unit_vectors_is_one() {
        let v = vec![0.6f32, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_handles_unnormalized_and_zero_vectors() {
        let a = vec![3.0f32, 0.0];
        let b = vec![10.0f32, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-9);

        let orthogonal = vec![0.0f32, 5.0];
        assert!(cosine_similarity(&a, &orthogonal).abs() < 1e-9);

        let zero = vec![0.0f32, 0.0];
        assert_eq!(cosine_similarity(&a, &zero), 0.0);
    }

    #[test]
    fn upsert_by_id_keeps_one_record_with_latest_text() {
        let index = SimilarityIndex::in_memory(2).unwrap();

        let mut first = chunk("doc_chunk_0", "doc.pdf", 0, vec![1.0, 0.0]);
        first.text = "old text".to_string();
        index.store_batch(&[first]).unwrap();

        for _ in 0..3 {
            let mut again = chunk("doc_chunk_0", "doc.pdf", 0, vec![1.0, 0.0]);
            again.text = "new text".to_string();
            index.store_batch(&[again]).unwrap();
        }

        assert_eq!(index.count().unwrap(), 1);
        let results = index.search_top_k(&[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk.text, "new text");
    }

    #[test]
    fn search_ranks_by_similarity_descending() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        index
            .store_batch(&[
                chunk("a", "doc.pdf", 0, vec![0.0, 1.0]),
                chunk("b", "doc.pdf", 1, vec![1.0, 0.0]),
                chunk("c", "doc.pdf", 2, vec![0.7, 0.7]),
            ])
            .unwrap();

        let results = index.search_top_k(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(results[0].similarity > results[1].similarity);
        assert!(results[1].similarity > results[2].similarity);
    }

    #[test]
    fn equal_scores_break_ties_by_insertion_order() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        index
            .store_batch(&[
                chunk("later_alphabetically", "z.pdf", 0, vec![1.0, 0.0]),
                chunk("earlier_alphabetically", "a.pdf", 0, vec![1.0, 0.0]),
            ])
            .unwrap();

        for _ in 0..5 {
            let results = index.search_top_k(&[1.0, 0.0], 2).unwrap();
            assert_eq!(results[0].chunk.id, "later_alphabetically");
            assert_eq!(results[1].chunk.id, "earlier_alphabetically");
        }
    }

    #[test]
    fn reingestion_preserves_tie_break_rank() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        index
            .store_batch(&[
                chunk("first", "doc.pdf", 0, vec![1.0, 0.0]),
                chunk("second", "doc.pdf", 1, vec![1.0, 0.0]),
            ])
            .unwrap();

        // Overwriting "first" must not demote it behind "second".
        index
            .store_batch(&[chunk("first", "doc.pdf", 0, vec![1.0, 0.0])])
            .unwrap();

        let results = index.search_top_k(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].chunk.id, "first");
    }

    #[test]
    fn results_are_bounded_by_k_and_store_size() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        index
            .store_batch(&[
                chunk("a", "doc.pdf", 0, vec![1.0, 0.0]),
                chunk("b", "doc.pdf", 1, vec![0.0, 1.0]),
            ])
            .unwrap();

        assert_eq!(index.search_top_k(&[1.0, 0.0], 1).unwrap().len(), 1);
        assert_eq!(index.search_top_k(&[1.0, 0.0], 2).unwrap().len(), 2);
        // k above the stored count clamps instead of erroring
        assert_eq!(index.search_top_k(&[1.0, 0.0], 50).unwrap().len(), 2);
    }

    #[test]
    fn empty_store_returns_empty_not_error() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        assert!(index.search_top_k(&[1.0, 0.0], 5).unwrap().is_empty());
        assert_eq!(index.count().unwrap(), 0);
        assert!(index.list_sources().unwrap().is_empty());
    }

    #[test]
    fn sources_are_distinct_and_sorted() {
        let index = SimilarityIndex::in_memory(1).unwrap();
        index
            .store_batch(&[
                chunk("z0", "zebra.pdf", 0, vec![1.0]),
                chunk("a0", "alpha.pdf", 0, vec![1.0]),
                chunk("z1", "zebra.pdf", 1, vec![1.0]),
            ])
            .unwrap();

        assert_eq!(index.list_sources().unwrap(), vec!["alpha.pdf", "zebra.pdf"]);
    }

    #[test]
    fn delete_by_source_reports_removed_count() {
        let index = SimilarityIndex::in_memory(1).unwrap();
        index
            .store_batch(&[
                chunk("d0", "doc.pdf", 0, vec![1.0]),
                chunk("d1", "doc.pdf", 1, vec![1.0]),
                chunk("o0", "other.pdf", 0, vec![1.0]),
            ])
            .unwrap();

        assert_eq!(index.delete_by_source("doc.pdf").unwrap(), 2);
        assert_eq!(index.count().unwrap(), 1);
        assert_eq!(index.delete_by_source("missing.pdf").unwrap(), 0);
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn mid_batch_failure_reports_persisted_count() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        let batch = vec![
            chunk("good", "doc.pdf", 0, vec![1.0, 0.0]),
            chunk("bad_dims", "doc.pdf", 1, vec![1.0, 0.0, 0.0]),
            chunk("never_reached", "doc.pdf", 2, vec![0.0, 1.0]),
        ];

        match index.store_batch(&batch) {
            Err(Error::BatchWrite { persisted, .. }) => assert_eq!(persisted, 1),
            other => panic!("expected BatchWrite, got {other:?}"),
        }
        // Already-persisted rows remain; no rollback.
        assert_eq!(index.count().unwrap(), 1);
    }

    #[test]
    fn query_dimension_mismatch_is_an_error() {
        let index = SimilarityIndex::in_memory(2).unwrap();
        assert!(index.search_top_k(&[1.0, 0.0, 0.0], 1).is_err());
    }

    #[test]
    fn index_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");

        {
            let index = SimilarityIndex::open(&path, 2).unwrap();
            index
                .store_batch(&[chunk("d0", "doc.pdf", 0, vec![1.0, 0.0])])
                .unwrap();
        }

        let reopened = SimilarityIndex::open(&path, 2).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        let results = reopened.search_top_k(&[1.0, 0.0], 1).unwrap();
        assert_eq!(results[0].chunk.id, "d0");
        assert!((results[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn embedding_blob_round_trips() {
        let original = vec![0.25f32, -1.5, 3.75, 0.0];
        let decoded = blob_to_embedding(&embedding_to_blob(&original)).unwrap();
        assert_eq!(decoded, original);
    }
}
