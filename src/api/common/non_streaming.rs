use std::time::Instant;

use axum::response::Response;

use crate::config::DefaultsConfig;
use crate::error::GatewayError;
use crate::observability::log_request_complete;
use crate::protocol::openai_chat::response_encoder::{build_chat_completion, encode_pretty_json};
use crate::stream::{aggregate_body, AggregationSource};
use crate::util::unix_now_secs;

#[inline]
pub(crate) fn ok_json_response(body_bytes: bytes::Bytes) -> Response {
    let mut response = Response::new(axum::body::Body::from(body_bytes));
    *response.status_mut() = http::StatusCode::OK;
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    response
}

/// Drain the backend body and answer with one chat completion document.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] when the body cannot be read or the
/// document cannot be serialized.
pub(crate) async fn aggregate_response(
    backend_response: reqwest::Response,
    response_id: &str,
    model: &str,
    defaults: &DefaultsConfig,
    started: Instant,
) -> Result<Response, GatewayError> {
    let body = backend_response
        .bytes()
        .await
        .map_err(|e| GatewayError::internal("Error reading response body", e))?;

    let aggregation = aggregate_body(&body, &defaults.extraction_failed_notice);
    if aggregation.source == AggregationSource::Placeholder {
        tracing::warn!(response_id, model, "answering with extraction placeholder");
    }
    log_request_complete(
        model,
        false,
        aggregation.fragments,
        &aggregation.text,
        started.elapsed(),
    );

    let finish_reason = aggregation
        .finish_reason
        .as_deref()
        .unwrap_or(&defaults.fallback_finish_reason)
        .to_string();
    let document = build_chat_completion(
        response_id,
        unix_now_secs(),
        model,
        aggregation.text,
        &finish_reason,
        defaults,
    );
    Ok(ok_json_response(encode_pretty_json(&document)?))
}
