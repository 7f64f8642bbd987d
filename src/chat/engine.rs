//! Unified query entry point.
//!
//! Selects between PRD document generation and retrieval-grounded QA, runs
//! the chosen pipeline and reports which collections fed the answer.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::core::errors::ApiError;
use crate::llm::{GenerateRequest, LlmProvider};
use crate::retrieval::{is_prd_prompt, FusionRetriever, RetrievedChunk};

use super::prompts::{build_prd_prompt, build_qa_prompt, CONTEXT_SEPARATOR};

/// Marker source reported when an answer was generated without retrieval.
pub const PRD_PROMPT_ONLY: &str = "prd_prompt_only";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    Document,
    Qa,
}

/// The result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub answer: String,
    pub mode: AnswerMode,
    pub chunks: Vec<RetrievedChunk>,
    pub collections_used: BTreeSet<String>,
}

pub struct ChatEngine {
    retriever: FusionRetriever,
    llm: Arc<dyn LlmProvider>,
    chat_model: String,
}

impl ChatEngine {
    pub fn new(retriever: FusionRetriever, llm: Arc<dyn LlmProvider>, chat_model: String) -> Self {
        Self {
            retriever,
            llm,
            chat_model,
        }
    }

    /// Answer one user query.
    ///
    /// Generator failures propagate to the caller; retrieval failures were
    /// already isolated inside the fusion retriever.
    pub async fn answer(&self, user_query: &str) -> Result<ChatOutcome, ApiError> {
        if is_prd_prompt(user_query) {
            return self.answer_document(user_query).await;
        }
        self.answer_qa(user_query).await
    }

    async fn answer_document(&self, user_query: &str) -> Result<ChatOutcome, ApiError> {
        tracing::debug!("PRD intent detected, skipping retrieval");

        let prompt = build_prd_prompt(user_query);
        let raw = self
            .llm
            .generate(GenerateRequest::new(prompt), &self.chat_model)
            .await?;

        let mut collections_used = BTreeSet::new();
        collections_used.insert(PRD_PROMPT_ONLY.to_string());

        Ok(ChatOutcome {
            answer: raw.trim().to_string(),
            mode: AnswerMode::Document,
            chunks: Vec::new(),
            collections_used,
        })
    }

    async fn answer_qa(&self, user_query: &str) -> Result<ChatOutcome, ApiError> {
        let chunks = self.retriever.run(user_query).await;

        let context = chunks
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let prompt = build_qa_prompt(&context, user_query);
        let raw = self
            .llm
            .generate(GenerateRequest::new(prompt), &self.chat_model)
            .await?;

        let collections_used: BTreeSet<String> =
            chunks.iter().map(|chunk| chunk.source.clone()).collect();

        Ok(ChatOutcome {
            answer: raw.trim().to_string(),
            mode: AnswerMode::Qa,
            chunks,
            collections_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::core::config::RetrievalSettings;
    use crate::retrieval::store::{CorpusStore, ScoredHit, StoredChunk};

    /// LLM double that records prompts and echoes a canned answer.
    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        fn name(&self) -> &str {
            "recording"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(true)
        }

        async fn generate(
            &self,
            request: GenerateRequest,
            _model_id: &str,
        ) -> Result<String, ApiError> {
            self.prompts.lock().unwrap().push(request.prompt);
            Ok("  canned answer \n".to_string())
        }

        async fn embed(
            &self,
            _inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, ApiError> {
            Ok(Vec::new())
        }
    }

    struct SingleHitStore;

    #[async_trait]
    impl CorpusStore for SingleHitStore {
        async fn search(
            &self,
            collection: &str,
            query_text: &str,
            _top_k: usize,
        ) -> Result<Vec<ScoredHit>, ApiError> {
            if collection == "docs" && query_text == "widgets" {
                return Ok(vec![ScoredHit {
                    content: "Widgets are blue.".to_string(),
                    distance: 0.1,
                }]);
            }
            Ok(Vec::new())
        }

        async fn insert_batch(
            &self,
            _collection: &str,
            _items: Vec<(StoredChunk, Vec<f32>)>,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
            Ok(vec!["docs".to_string()])
        }

        async fn count(&self, _collection: &str) -> Result<usize, ApiError> {
            Ok(1)
        }
    }

    fn engine_with(store: Arc<dyn CorpusStore>, llm: Arc<RecordingLlm>) -> ChatEngine {
        let retriever = FusionRetriever::new(
            store,
            RetrievalSettings {
                collections: vec!["docs".to_string()],
                top_k_per_query: 3,
                max_final_results: 6,
            },
        );
        ChatEngine::new(retriever, llm, "mistral".to_string())
    }

    #[tokio::test]
    async fn prd_intent_skips_retrieval_and_marks_prompt_only() {
        let llm = Arc::new(RecordingLlm::new());
        let engine = engine_with(Arc::new(SingleHitStore), llm.clone());

        let outcome = engine.answer("Please create a PRD for login").await.unwrap();

        assert_eq!(outcome.mode, AnswerMode::Document);
        assert!(outcome.chunks.is_empty());
        assert!(outcome.collections_used.contains(PRD_PROMPT_ONLY));
        assert_eq!(outcome.answer, "canned answer");

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("senior product manager"));
        assert!(prompts[0].contains("Please create a PRD for login"));
    }

    #[tokio::test]
    async fn qa_mode_grounds_the_prompt_in_retrieved_chunks() {
        let llm = Arc::new(RecordingLlm::new());
        let engine = engine_with(Arc::new(SingleHitStore), llm.clone());

        let outcome = engine.answer("widgets").await.unwrap();

        assert_eq!(outcome.mode, AnswerMode::Qa);
        assert_eq!(outcome.chunks.len(), 1);
        assert_eq!(outcome.chunks[0].content, "Widgets are blue.");
        assert_eq!(outcome.chunks[0].source, "docs");
        assert_eq!(
            outcome.collections_used.iter().collect::<Vec<_>>(),
            vec!["docs"]
        );

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Widgets are blue."));
        assert!(prompts[0].contains("widgets"));
    }

    #[tokio::test]
    async fn qa_mode_with_no_matches_uses_an_empty_context() {
        let llm = Arc::new(RecordingLlm::new());
        let engine = engine_with(Arc::new(SingleHitStore), llm.clone());

        let outcome = engine.answer("unrelated question").await.unwrap();

        assert!(outcome.chunks.is_empty());
        assert!(outcome.collections_used.is_empty());

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Context:\n\n"));
    }
}
