use std::sync::Arc;

use crate::chat::ChatEngine;
use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::history::HistoryStore;
use crate::llm::{LlmProvider, OllamaProvider};
use crate::retrieval::{CorpusStore, FusionRetriever, SqliteCorpusStore};

/// Global application state shared across all routes.
///
/// Holds paths, configuration, the database-backed stores and the chat
/// engine that every query handler runs through.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Arc<Settings>,
    pub llm: Arc<dyn LlmProvider>,
    pub store: Arc<dyn CorpusStore>,
    pub engine: Arc<ChatEngine>,
    pub history: HistoryStore,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// Sets up paths, loads configuration, connects the history and corpus
    /// databases and wires the fusion retriever into the chat engine.
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Arc::new(Settings::load(&paths.config_path())?);

        let llm: Arc<dyn LlmProvider> =
            Arc::new(OllamaProvider::new(settings.llm.base_url.clone()));

        match llm.health_check().await {
            Ok(true) => tracing::info!("LLM backend reachable at {}", settings.llm.base_url),
            _ => tracing::warn!(
                "LLM backend not reachable at {}; queries will fail until it is up",
                settings.llm.base_url
            ),
        }

        let history = HistoryStore::new(paths.history_db_path.clone()).await?;

        let store: Arc<dyn CorpusStore> = Arc::new(
            SqliteCorpusStore::new(
                paths.as_ref(),
                llm.clone(),
                settings.llm.embedding_model.clone(),
            )
            .await?,
        );

        let retriever = FusionRetriever::new(store.clone(), settings.retrieval.clone());
        let engine = Arc::new(ChatEngine::new(
            retriever,
            llm.clone(),
            settings.llm.chat_model.clone(),
        ));

        Ok(Arc::new(AppState {
            paths,
            settings,
            llm,
            store,
            engine,
            history,
        }))
    }
}
