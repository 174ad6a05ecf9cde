use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::error::into_axum_response;
use crate::protocol::openai_chat::response_encoder::{build_model_list, encode_pretty_json};
use crate::routing::ProviderResolver;
use crate::state::AppState;
use crate::util::unix_now_secs;

use super::common::ok_json_response;

/// `GET /v1/models`: every known model, sorted by id.
///
/// A failed refresh only fails the listing when there is nothing cached to
/// fall back on.
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Response {
    if let Err(err) = state.maybe_refresh_models_cache().await {
        if state.models().is_empty() {
            return into_axum_response(&err);
        }
    }

    let list = build_model_list(state.models().list_models(), unix_now_secs());
    match encode_pretty_json(&list) {
        Ok(body) => ok_json_response(body),
        Err(err) => into_axum_response(&err),
    }
}

/// `POST|GET /v1/models/refresh`: refresh the models cache now.
pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> Response {
    // failures keep the previous entries and are logged by the state
    let _ = state.force_refresh_models().await;
    Json(json!({
        "status": "success",
        "message": "Model cache refreshed",
    }))
    .into_response()
}
