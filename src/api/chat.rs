use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Response;
use bytes::Bytes;
use http::{Method, StatusCode};

use crate::error::{into_axum_response, GatewayError};
use crate::protocol::backend::encoder::{build_backend_request, encode_backend_request};
use crate::protocol::openai_chat::ChatCompletionRequest;
use crate::routing::resolve_or_default;
use crate::state::AppState;
use crate::util::sanitize_backend_error;

use super::common::{aggregate_response, stream_response};

/// `POST /v1/chat/completions`.
pub async fn handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match handler_inner(&state, body).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                tracing::error!(error = %err, "chat completion failed");
            } else {
                tracing::warn!(error = %err, "chat completion rejected");
            }
            into_axum_response(&err)
        }
    }
}

async fn handler_inner(state: &AppState, body: Bytes) -> Result<Response, GatewayError> {
    let started = Instant::now();
    let request: ChatCompletionRequest = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::invalid_request_with("Invalid request body", e))?;
    if request.messages.is_empty() {
        return Err(GatewayError::invalid_request(
            "Missing or invalid 'messages' field",
        ));
    }

    let defaults = &state.config.defaults;
    let model = request
        .requested_model()
        .unwrap_or(&defaults.model)
        .to_string();

    // stale entries are still usable; the failure is already logged
    let _ = state.maybe_refresh_models_cache().await;
    let resolved = resolve_or_default(
        state.models(),
        &model,
        &defaults.model,
        &state.config.backend.default_provider,
    );
    tracing::debug!(
        model = %model,
        provider = %resolved.provider,
        backend_model = %resolved.model,
        stream = request.wants_stream(),
        messages = request.messages.len(),
        "forwarding chat completion"
    );
    if request.system_instruction().is_some() {
        tracing::debug!("using custom system instruction");
    }

    let backend_request = build_backend_request(
        &request,
        &resolved,
        state.new_thread_id(),
        &state.config.backend,
        defaults,
    );
    let backend_body = encode_backend_request(&backend_request, request.max_tokens)?;

    let backend_response = state
        .transport
        .send_request(
            state.backend.chat_url(),
            Method::POST,
            state.backend.chat_headers(),
            backend_body,
        )
        .await?;

    let status = backend_response.status();
    if status != StatusCode::OK {
        let error_body = backend_response.bytes().await.unwrap_or_default();
        return Err(GatewayError::Upstream {
            status: status.as_u16(),
            message: sanitize_backend_error(&error_body),
        });
    }

    let response_id = state.next_response_id();
    if request.wants_stream() {
        Ok(stream_response(backend_response, response_id, model))
    } else {
        aggregate_response(backend_response, &response_id, &model, defaults, started).await
    }
}
