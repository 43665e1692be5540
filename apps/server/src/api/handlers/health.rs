use crate::{state::AppState, Result};
use axum::{extract::State, Json};
use serde_json::{json, Value as JsonValue};

/// Liveness plus store reachability.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<JsonValue>> {
    state.store.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
