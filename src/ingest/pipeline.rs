//! Batch ingestion into the corpus store.
//!
//! Scans a directory of `.jsonl` files, flattens and chunks each line,
//! embeds new chunks in batches and writes them to a collection. The set of
//! already-embedded chunk ids is an explicit snapshot: loaded from disk,
//! passed in, and returned updated.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::core::config::IngestSettings;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;
use crate::retrieval::{CorpusStore, StoredChunk};

use super::chunker::TextChunker;
use super::jsonl::parse_jsonl;

/// Snapshot of chunk ids already written to the store.
#[derive(Debug, Clone, Default)]
pub struct SeenIds {
    ids: HashSet<String>,
}

impl SeenIds {
    /// Load the snapshot from a newline-separated id file. A missing file
    /// is an empty snapshot.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(ApiError::internal)?;
        Ok(Self {
            ids: contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    /// Append ids added since the snapshot was loaded.
    pub fn append_to(&self, path: &Path, new_ids: &[String]) -> Result<(), ApiError> {
        use std::io::Write;

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(ApiError::internal)?;
        for id in new_ids {
            writeln!(file, "{}", id).map_err(ApiError::internal)?;
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: String) -> bool {
        self.ids.insert(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Stable chunk id derived from the source file name and chunk text.
pub fn chunk_id(file_name: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_name.as_bytes());
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// What one ingestion run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub documents: usize,
    pub chunks_new: usize,
    pub chunks_skipped: usize,
    pub lines_skipped: usize,
}

pub struct IngestPipeline {
    store: Arc<dyn CorpusStore>,
    embedder: Arc<dyn LlmProvider>,
    embedding_model: String,
    settings: IngestSettings,
}

impl IngestPipeline {
    pub fn new(
        store: Arc<dyn CorpusStore>,
        embedder: Arc<dyn LlmProvider>,
        embedding_model: String,
        settings: IngestSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            embedding_model,
            settings,
        }
    }

    /// Ingest every `.jsonl` file under `dir` into `collection`.
    ///
    /// Takes the previously-seen id snapshot and returns the updated one
    /// together with a run report. Newly written ids are appended to
    /// `seen_ids_path` as they are flushed, so a crashed run never
    /// re-embeds what it already stored.
    pub async fn run(
        &self,
        dir: &Path,
        collection: &str,
        mut seen: SeenIds,
        seen_ids_path: &Path,
    ) -> Result<(SeenIds, IngestReport), ApiError> {
        let mut report = IngestReport::default();
        let chunker = TextChunker::new(self.settings.chunk_size, self.settings.chunk_overlap);

        for path in jsonl_files(dir)? {
            tracing::info!("Processing file: {}", path.display());
            report.files += 1;

            let parsed = parse_jsonl(&path)?;
            report.lines_skipped += parsed.lines_skipped;
            report.documents += parsed.documents.len();

            let mut batch: Vec<StoredChunk> = Vec::new();

            for document in parsed.documents {
                for text in chunker.split(&document.content) {
                    let id = chunk_id(&document.source, &text);
                    if seen.contains(&id) {
                        report.chunks_skipped += 1;
                        continue;
                    }

                    batch.push(StoredChunk {
                        chunk_id: id,
                        content: text,
                        source: document.source.clone(),
                        metadata: None,
                    });

                    if batch.len() >= self.settings.embed_batch_size {
                        report.chunks_new += self
                            .flush_batch(collection, &mut batch, &mut seen, seen_ids_path)
                            .await?;
                    }
                }
            }

            if !batch.is_empty() {
                report.chunks_new += self
                    .flush_batch(collection, &mut batch, &mut seen, seen_ids_path)
                    .await?;
            }
        }

        tracing::info!(
            "Ingest finished: {} new chunks, {} already embedded, {} bad lines",
            report.chunks_new,
            report.chunks_skipped,
            report.lines_skipped
        );

        Ok((seen, report))
    }

    async fn flush_batch(
        &self,
        collection: &str,
        batch: &mut Vec<StoredChunk>,
        seen: &mut SeenIds,
        seen_ids_path: &Path,
    ) -> Result<usize, ApiError> {
        let chunks = std::mem::take(batch);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();

        tracing::debug!("Embedding batch of size {}", texts.len());
        let embeddings = self.embedder.embed(&texts, &self.embedding_model).await?;

        if embeddings.len() != chunks.len() {
            return Err(ApiError::Internal(format!(
                "Embedding count mismatch: {} texts, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let new_ids: Vec<String> = chunks.iter().map(|c| c.chunk_id.clone()).collect();
        let written = chunks.len();

        self.store
            .insert_batch(collection, chunks.into_iter().zip(embeddings).collect())
            .await?;

        seen.append_to(seen_ids_path, &new_ids)?;
        for id in new_ids {
            seen.insert(id);
        }

        Ok(written)
    }
}

fn jsonl_files(dir: &Path) -> Result<Vec<PathBuf>, ApiError> {
    if !dir.exists() {
        return Err(ApiError::NotFound(format!(
            "Ingest directory not found: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(ApiError::internal)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("jsonl"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}
