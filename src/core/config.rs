use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub corpus_db_path: PathBuf,
    pub history_db_path: PathBuf,
    pub seen_ids_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        let log_dir = user_data_dir.join("logs");
        let corpus_db_path = user_data_dir.join("corpus.db");
        let history_db_path = user_data_dir.join("chat_history.db");
        let seen_ids_path = user_data_dir.join("embedded_ids.txt");

        for dir in [&user_data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            corpus_db_path,
            history_db_path,
            seen_ids_path,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("PROGRESS_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.project_root.join("config.yml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("PROGRESS_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("PROGRESS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("ProgressAssistant");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("ProgressAssistant");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("progress-assistant")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Static service configuration, loaded once from `config.yml`.
///
/// Every field carries a serde default so a missing or partial file still
/// produces a working configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the Ollama-compatible API.
    pub base_url: String,
    /// Model used for answer and PRD generation.
    pub chat_model: String,
    /// Model used for embeddings, at ingest and at query time.
    pub embedding_model: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "mistral".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Collections searched by the fusion retriever, in order.
    pub collections: Vec<String>,
    /// Matches requested per expanded query per collection.
    pub top_k_per_query: usize,
    /// Upper bound on the pooled, ranked result set.
    pub max_final_results: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            collections: vec![
                "product_embeddings".to_string(),
                "prd_chunks".to_string(),
            ],
            top_k_per_query: 3,
            max_final_results: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Directory scanned for `.jsonl` source files.
    pub data_dir: String,
    /// Default collection that ingested chunks land in.
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            data_dir: "data/jsonl_files".to_string(),
            collection: "product_embeddings".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            embed_batch_size: 64,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(path).map_err(ApiError::internal)?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ApiError::BadRequest(format!("Invalid config at '{}': {}", path.display(), e)))
    }
}
