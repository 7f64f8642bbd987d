//! Fusion retrieval across collections.
//!
//! Each query is expanded into several variants; every variant is searched
//! against every configured collection. Hits are pooled per collection with
//! content-keyed deduplication, then the pools are merged, ranked by
//! distance and truncated to a bounded top-K.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::config::RetrievalSettings;

use super::expansion::expand_query;
use super::store::{CorpusStore, RetrievedChunk};

/// Chunks without a score sort after every scored chunk.
const UNSCORED_SENTINEL: f32 = 999.0;

pub struct FusionRetriever {
    store: Arc<dyn CorpusStore>,
    settings: RetrievalSettings,
}

impl FusionRetriever {
    pub fn new(store: Arc<dyn CorpusStore>, settings: RetrievalSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Run fusion retrieval for one query.
    ///
    /// A failing search for one (expansion, collection) pair is logged and
    /// skipped; it never aborts the other expansions or collections. An
    /// empty corpus yields an empty result, not an error.
    pub async fn run(&self, query: &str) -> Vec<RetrievedChunk> {
        let expanded = expand_query(query);
        let mut all_results: Vec<RetrievedChunk> = Vec::new();

        for collection in &self.settings.collections {
            // Pool invariant: the first expansion to return a given content
            // wins; later hits for the same content never overwrite its
            // score, even when their distance is lower.
            let mut seen: HashSet<String> = HashSet::new();
            let mut pooled: Vec<RetrievedChunk> = Vec::new();

            for fused_query in &expanded {
                let hits = match self
                    .store
                    .search(collection, fused_query, self.settings.top_k_per_query)
                    .await
                {
                    Ok(hits) => hits,
                    Err(err) => {
                        tracing::warn!(
                            "Fusion search failed on '{}' in '{}': {}",
                            fused_query,
                            collection,
                            err
                        );
                        continue;
                    }
                };

                for hit in hits {
                    if seen.insert(hit.content.clone()) {
                        pooled.push(RetrievedChunk {
                            content: hit.content,
                            source: collection.clone(),
                            score: Some(hit.distance),
                        });
                    }
                }
            }

            all_results.extend(pooled);
        }

        // Stable sort keeps pool order for equal scores.
        all_results.sort_by(|a, b| {
            let left = a.score.unwrap_or(UNSCORED_SENTINEL);
            let right = b.score.unwrap_or(UNSCORED_SENTINEL);
            left.partial_cmp(&right).unwrap_or(std::cmp::Ordering::Equal)
        });
        all_results.truncate(self.settings.max_final_results);

        all_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::errors::ApiError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::retrieval::store::{ScoredHit, StoredChunk};

    /// In-memory store scripting hits per (collection, query) pair, with
    /// optional forced failures.
    #[derive(Default)]
    struct ScriptedStore {
        hits: HashMap<(String, String), Vec<ScoredHit>>,
        failing_collections: HashSet<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedStore {
        fn with_hits(mut self, collection: &str, query: &str, hits: Vec<(&str, f32)>) -> Self {
            self.hits.insert(
                (collection.to_string(), query.to_string()),
                hits.into_iter()
                    .map(|(content, distance)| ScoredHit {
                        content: content.to_string(),
                        distance,
                    })
                    .collect(),
            );
            self
        }

        fn failing(mut self, collection: &str) -> Self {
            self.failing_collections.insert(collection.to_string());
            self
        }
    }

    #[async_trait]
    impl CorpusStore for ScriptedStore {
        async fn search(
            &self,
            collection: &str,
            query_text: &str,
            _top_k: usize,
        ) -> Result<Vec<ScoredHit>, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((collection.to_string(), query_text.to_string()));

            if self.failing_collections.contains(collection) {
                return Err(ApiError::Internal("collection unreachable".to_string()));
            }

            Ok(self
                .hits
                .get(&(collection.to_string(), query_text.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        async fn insert_batch(
            &self,
            _collection: &str,
            _items: Vec<(StoredChunk, Vec<f32>)>,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }

        async fn count(&self, _collection: &str) -> Result<usize, ApiError> {
            Ok(0)
        }
    }

    fn settings(collections: &[&str], max_final_results: usize) -> RetrievalSettings {
        RetrievalSettings {
            collections: collections.iter().map(|c| c.to_string()).collect(),
            top_k_per_query: 3,
            max_final_results,
        }
    }

    #[tokio::test]
    async fn returns_matching_chunk_tagged_with_collection() {
        let store = ScriptedStore::default().with_hits(
            "docs",
            "widgets",
            vec![("Widgets are blue.", 0.1)],
        );
        let retriever = FusionRetriever::new(Arc::new(store), settings(&["docs"], 6));

        let results = retriever.run("widgets").await;
        assert!(!results.is_empty());
        assert_eq!(results[0].content, "Widgets are blue.");
        assert_eq!(results[0].source, "docs");
        assert_eq!(results[0].score, Some(0.1));
    }

    #[tokio::test]
    async fn first_write_wins_even_when_later_score_is_better() {
        let store = ScriptedStore::default()
            .with_hits("docs", "widgets", vec![("Widgets are blue.", 0.8)])
            .with_hits("docs", "Explain widgets", vec![("Widgets are blue.", 0.1)]);
        let retriever = FusionRetriever::new(Arc::new(store), settings(&["docs"], 6));

        let results = retriever.run("widgets").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, Some(0.8));
    }

    #[tokio::test]
    async fn results_are_sorted_ascending_and_truncated() {
        let store = ScriptedStore::default().with_hits(
            "docs",
            "widgets",
            vec![
                ("a", 0.9),
                ("b", 0.2),
                ("c", 0.5),
                ("d", 0.4),
                ("e", 0.1),
                ("f", 0.3),
                ("g", 0.7),
            ],
        );
        let retriever = FusionRetriever::new(Arc::new(store), settings(&["docs"], 6));

        let results = retriever.run("widgets").await;
        assert_eq!(results.len(), 6);
        for pair in results.windows(2) {
            assert!(pair[0].score.unwrap() <= pair[1].score.unwrap());
        }
        assert_eq!(results[0].content, "e");
    }

    #[tokio::test]
    async fn failing_collection_contributes_nothing_and_no_error_escapes() {
        let store = ScriptedStore::default()
            .failing("broken")
            .with_hits("docs", "widgets", vec![("Widgets are blue.", 0.1)]);
        let retriever =
            FusionRetriever::new(Arc::new(store), settings(&["broken", "docs"], 6));

        let results = retriever.run("widgets").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "docs");
    }

    #[tokio::test]
    async fn empty_store_yields_empty_result_set() {
        let store = ScriptedStore::default();
        let retriever = FusionRetriever::new(
            Arc::new(store),
            settings(&["product_embeddings", "prd_chunks"], 6),
        );

        let results = retriever.run("anything").await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn every_expansion_is_issued_against_every_collection() {
        let store = Arc::new(ScriptedStore::default());
        let retriever = FusionRetriever::new(store.clone(), settings(&["one", "two"], 6));

        retriever.run("widgets").await;

        let calls = store.calls.lock().unwrap();
        assert_eq!(calls.len(), 10);
        assert_eq!(calls[0], ("one".to_string(), "widgets".to_string()));
        assert_eq!(
            calls[5],
            ("two".to_string(), "widgets".to_string())
        );
    }

    #[tokio::test]
    async fn duplicate_content_across_collections_is_kept_per_collection() {
        let store = ScriptedStore::default()
            .with_hits("one", "widgets", vec![("shared text", 0.2)])
            .with_hits("two", "widgets", vec![("shared text", 0.1)]);
        let retriever = FusionRetriever::new(Arc::new(store), settings(&["one", "two"], 6));

        let results = retriever.run("widgets").await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "two");
        assert_eq!(results[1].source, "one");
    }
}
