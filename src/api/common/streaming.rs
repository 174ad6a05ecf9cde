use std::convert::Infallible;

use axum::response::Response;
use bytes::Bytes;
use futures_util::StreamExt;

use crate::stream::{reemit_stream, StreamReemitter};

#[inline]
fn sse_ok_response(body: axum::body::Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = http::StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(
        http::header::CACHE_CONTROL,
        http::HeaderValue::from_static("no-cache"),
    );
    headers.insert(
        http::header::CONNECTION,
        http::HeaderValue::from_static("keep-alive"),
    );
    response
}

/// Re-emit the backend body as an `OpenAI` chunk stream.
///
/// Headers go out immediately; each chunk is its own body frame.
pub(crate) fn stream_response(
    backend_response: reqwest::Response,
    response_id: String,
    model: String,
) -> Response {
    let reemitter = StreamReemitter::new(response_id, model);
    let frames = reemit_stream(backend_response.bytes_stream(), reemitter);
    sse_ok_response(axum::body::Body::from_stream(
        frames.map(Ok::<Bytes, Infallible>),
    ))
}
