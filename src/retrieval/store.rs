//! Abstract interface for the vector store holding
//! embedded text chunks, partitioned into named collections.
//!
//! The primary implementation is `SqliteCorpusStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A chunk as stored in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Content-derived identifier, stable across ingest runs.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source identifier (filename of the ingested document).
    pub source: String,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// A raw similarity-search hit: content plus its distance to the query.
/// Lower distance = more relevant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHit {
    pub content: String,
    pub distance: f32,
}

/// A chunk after fusion retrieval, tagged with the collection it came from.
///
/// `score` is the distance assigned when the chunk was first pooled; a chunk
/// without a score ranks last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
    pub score: Option<f32>,
}

/// Abstract trait for corpus storage backends.
///
/// `search` takes query text, not an embedding: the store owns the query
/// embedding step so stored and query vectors always come from the same
/// model.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Similarity search within one collection. May fail; the fusion
    /// retriever catches and logs per-query failures.
    async fn search(
        &self,
        collection: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredHit>, ApiError>;

    /// Insert chunks with their embeddings into a collection.
    async fn insert_batch(
        &self,
        collection: &str,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<(), ApiError>;

    /// Names of all collections that currently hold chunks.
    async fn list_collections(&self) -> Result<Vec<String>, ApiError>;

    /// Chunk count for one collection.
    async fn count(&self, collection: &str) -> Result<usize, ApiError>;
}
