use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::chat::AnswerMode;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub session_id: Option<String>,
}

/// Answer one user query, optionally recording the turn into a session.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_query = payload.query.trim();
    if user_query.is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }

    let outcome = state.engine.answer(user_query).await?;

    let mode = match outcome.mode {
        AnswerMode::Document => "document",
        AnswerMode::Qa => "qa",
    };

    if let Some(session_id) = payload.session_id.as_deref() {
        state
            .history
            .add_message(session_id, "user", user_query, None)
            .await?;
        state
            .history
            .add_message(
                session_id,
                "assistant",
                &outcome.answer,
                Some(json!({
                    "mode": mode,
                    "collections_used": &outcome.collections_used,
                })),
            )
            .await?;
    }

    Ok(Json(json!({
        "answer": outcome.answer,
        "mode": mode,
        "collections_used": outcome.collections_used,
        "chunks": outcome.chunks,
        "session_id": payload.session_id,
    })))
}
