use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check handler.
/// Returns JSON with status and a non-secret config summary.
pub fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "raycast-relay is running",
        "config": {
            "default_model": config.defaults.model,
            "default_provider": config.backend.default_provider,
            "models_cached": state.models().len(),
            "models_refresh_enabled": state.backend.models_url().is_some(),
            "models_cache_ttl_secs": config.server.models_cache_ttl_secs,
            "features": {
                "log_level": config.features.log_level,
            }
        }
    }))
}
