use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let llm_reachable = state.llm.health_check().await.unwrap_or(false);

    Json(json!({
        "status": "ok",
        "llm": {
            "provider": state.llm.name(),
            "reachable": llm_reachable
        }
    }))
}
