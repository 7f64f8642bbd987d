//! SQLite-backed corpus store implementation.
//!
//! In-process vector store using SQLite for chunk storage and brute-force
//! cosine ranking for search. Query text is embedded through the configured
//! LLM provider before ranking.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{CorpusStore, ScoredHit, StoredChunk};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

pub struct SqliteCorpusStore {
    pool: SqlitePool,
    embedder: Arc<dyn LlmProvider>,
    embedding_model: String,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteCorpusStore {
    pub async fn new(
        paths: &AppPaths,
        embedder: Arc<dyn LlmProvider>,
        embedding_model: String,
    ) -> Result<Self, ApiError> {
        Self::with_path(paths.corpus_db_path.clone(), embedder, embedding_model).await
    }

    pub async fn with_path(
        db_path: PathBuf,
        embedder: Arc<dyn LlmProvider>,
        embedding_model: String,
    ) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self {
            pool,
            embedder,
            embedding_model,
            db_path,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS corpus_chunks (
                chunk_id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_corpus_collection ON corpus_chunks(collection)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    async fn embed_query(&self, query_text: &str) -> Result<Vec<f32>, ApiError> {
        let mut embeddings = self
            .embedder
            .embed(&[query_text.to_string()], &self.embedding_model)
            .await?;

        if embeddings.is_empty() {
            return Err(ApiError::Internal(
                "Embedding provider returned no vectors".to_string(),
            ));
        }
        Ok(embeddings.remove(0))
    }
}

#[async_trait]
impl CorpusStore for SqliteCorpusStore {
    async fn search(
        &self,
        collection: &str,
        query_text: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredHit>, ApiError> {
        let query_embedding = self.embed_query(query_text).await?;

        let rows = sqlx::query(
            "SELECT content, embedding FROM corpus_chunks WHERE collection = ?1",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut scored: Vec<ScoredHit> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored_emb = Self::deserialize_embedding(&embedding_bytes);
                let similarity = Self::cosine_similarity(&query_embedding, &stored_emb);

                Some(ScoredHit {
                    content: row.get("content"),
                    distance: 1.0 - similarity,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.max(1));

        Ok(scored)
    }

    async fn insert_batch(
        &self,
        collection: &str,
        items: Vec<(StoredChunk, Vec<f32>)>,
    ) -> Result<(), ApiError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;

        for (chunk, embedding) in &items {
            let blob = Self::serialize_embedding(embedding);
            let metadata_str = chunk
                .metadata
                .as_ref()
                .map(|m| serde_json::to_string(m).unwrap_or_default())
                .unwrap_or_else(|| "{}".to_string());

            sqlx::query(
                "INSERT OR REPLACE INTO corpus_chunks (chunk_id, collection, content, source, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&chunk.chunk_id)
            .bind(collection)
            .bind(&chunk.content)
            .bind(&chunk.source)
            .bind(&metadata_str)
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
        let rows = sqlx::query(
            "SELECT DISTINCT collection FROM corpus_chunks ORDER BY collection",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("collection"))
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, ApiError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM corpus_chunks WHERE collection = ?1")
                .bind(collection)
                .fetch_one(&self.pool)
                .await
                .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::GenerateRequest;

    /// Embedder that maps known texts to fixed vectors, so similarity is
    /// controlled by the test.
    struct FixedEmbedder;

    #[async_trait]
    impl LlmProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn generate(
            &self,
            _request: GenerateRequest,
            _model_id: &str,
        ) -> Result<String, ApiError> {
            Ok(String::new())
        }

        async fn embed(
            &self,
            inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(inputs
                .iter()
                .map(|text| {
                    if text.contains("blue") {
                        vec![1.0, 0.0, 0.0]
                    } else if text.contains("ocean") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    async fn test_store() -> SqliteCorpusStore {
        let tmp = std::env::temp_dir().join(format!(
            "progress-corpus-test-{}.db",
            uuid::Uuid::new_v4()
        ));
        SqliteCorpusStore::with_path(tmp, Arc::new(FixedEmbedder), "fixed".to_string())
            .await
            .unwrap()
    }

    fn make_chunk(id: &str, content: &str) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            content: content.to_string(),
            source: "test.jsonl".to_string(),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn insert_and_search_ranks_by_distance() {
        let store = test_store().await;

        store
            .insert_batch(
                "docs",
                vec![
                    (make_chunk("c1", "Widgets are blue."), vec![1.0, 0.0, 0.0]),
                    (make_chunk("c2", "The ocean is deep."), vec![0.0, 1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let hits = store.search("docs", "blue widgets", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "Widgets are blue.");
        assert!(hits[0].distance < 0.01);
        assert!(hits[0].distance < hits[1].distance);
    }

    #[tokio::test]
    async fn unknown_collection_is_empty_not_an_error() {
        let store = test_store().await;
        let hits = store.search("missing", "anything", 3).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn insert_is_idempotent_by_chunk_id() {
        let store = test_store().await;

        let chunk = make_chunk("c1", "Widgets are blue.");
        store
            .insert_batch("docs", vec![(chunk.clone(), vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();
        store
            .insert_batch("docs", vec![(chunk, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_collections_returns_distinct_names() {
        let store = test_store().await;

        store
            .insert_batch("prd_chunks", vec![(make_chunk("a", "x"), vec![1.0])])
            .await
            .unwrap();
        store
            .insert_batch(
                "product_embeddings",
                vec![(make_chunk("b", "y"), vec![1.0])],
            )
            .await
            .unwrap();

        let names = store.list_collections().await.unwrap();
        assert_eq!(names, vec!["prd_chunks", "product_embeddings"]);
    }
}
