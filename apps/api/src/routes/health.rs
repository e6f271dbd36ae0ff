use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and which suggestion backend is active.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let backend = if state.dispatcher.has_provider() {
        "provider"
    } else {
        "heuristic"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "smart-todo-api",
        "suggestions": {
            "backend": backend,
            "model": state.dispatcher.has_provider().then(|| state.config.ai_provider_model.clone())
        }
    }))
}
