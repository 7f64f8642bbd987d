use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::ingest::{IngestPipeline, SeenIds};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    /// Directory of `.jsonl` files; defaults to the configured data dir.
    pub data_dir: Option<String>,
    /// Target collection; defaults to the configured ingest collection.
    pub collection: Option<String>,
}

/// Run a full ingestion pass over a directory of JSONL files.
///
/// Ingestion is synchronous: the response carries the run report.
pub async fn run_ingest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let data_dir = payload
        .data_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| state.paths.project_root.join(&state.settings.ingest.data_dir));
    let collection = payload
        .collection
        .unwrap_or_else(|| state.settings.ingest.collection.clone());

    if collection.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Collection name must not be empty".to_string(),
        ));
    }

    tracing::info!(
        "Starting ingest from {} into '{}'",
        data_dir.display(),
        collection
    );

    let seen = SeenIds::load(&state.paths.seen_ids_path)?;
    let pipeline = IngestPipeline::new(
        state.store.clone(),
        state.llm.clone(),
        state.settings.llm.embedding_model.clone(),
        state.settings.ingest.clone(),
    );

    let (_, report) = pipeline
        .run(&data_dir, &collection, seen, &state.paths.seen_ids_path)
        .await?;

    Ok(Json(json!({ "collection": collection, "report": report })))
}

/// List collections together with their chunk counts.
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let names = state.store.list_collections().await?;

    let mut collections: Vec<Value> = Vec::with_capacity(names.len());
    for name in names {
        let count = state.store.count(&name).await?;
        collections.push(json!({ "name": name, "count": count }));
    }

    Ok(Json(json!({ "collections": collections })))
}
