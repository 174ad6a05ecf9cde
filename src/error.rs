use crate::protocol::error_shapes::openai_error_payload;

/// Error type shared by the request path.
///
/// Event-level extraction misses never surface here; they are logged and
/// skipped by the stream module.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("{message}")]
    InvalidRequest {
        message: String,
        details: Option<String>,
    },
    #[error("Backend API error: {status} {message}")]
    Upstream { status: u16, message: String },
    #[error("Error sending request to backend: {0}")]
    Transport(String),
    #[error("An error occurred while fetching models: {0}")]
    ModelsFetch(String),
    #[error("{message}")]
    Internal {
        message: String,
        details: Option<String>,
    },
}

/// Broad error category for status code and type tag selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    Relay,
    ServerError,
}

impl GatewayError {
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn invalid_request_with(message: impl Into<String>, details: impl ToString) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            details: Some(details.to_string()),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>, details: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            details: Some(details.to_string()),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::InvalidRequest { .. } => ErrorCategory::InvalidRequest,
            GatewayError::Upstream { .. }
            | GatewayError::Transport(_)
            | GatewayError::ModelsFetch(_) => ErrorCategory::Relay,
            GatewayError::Config(_) | GatewayError::Internal { .. } => ErrorCategory::ServerError,
        }
    }

    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            GatewayError::InvalidRequest { details, .. } | GatewayError::Internal { details, .. } => {
                details.as_deref()
            }
            GatewayError::Transport(detail) | GatewayError::ModelsFetch(detail) => {
                Some(detail.as_str())
            }
            GatewayError::Config(_) | GatewayError::Upstream { .. } => None,
        }
    }

    /// HTTP status for the outbound error document.
    ///
    /// Backend statuses are propagated as-is; anything that is not a valid
    /// status code becomes 502.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            GatewayError::InvalidRequest { .. } => http::StatusCode::BAD_REQUEST,
            GatewayError::Upstream { status, .. } => {
                http::StatusCode::from_u16(*status).unwrap_or(http::StatusCode::BAD_GATEWAY)
            }
            GatewayError::Transport(_)
            | GatewayError::ModelsFetch(_)
            | GatewayError::Config(_)
            | GatewayError::Internal { .. } => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ---------------------------------------------------------------------------
// Format an error as an OpenAI-style error document
// ---------------------------------------------------------------------------

/// Format an error, returning (`status_code`, JSON body).
#[must_use]
pub fn format_error(err: &GatewayError) -> (http::StatusCode, serde_json::Value) {
    let message = err.to_string();
    let body = openai_error_payload(err.category(), &message, err.details());
    (err.status_code(), body)
}

// ---------------------------------------------------------------------------
// Axum integration
// ---------------------------------------------------------------------------

/// Convert a `GatewayError` into an axum response.
#[must_use]
pub fn into_axum_response(err: &GatewayError) -> axum::response::Response {
    use axum::response::IntoResponse;
    let (status, body) = format_error(err);
    (status, axum::Json(body)).into_response()
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        into_axum_response(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_maps_to_400() {
        let err = GatewayError::invalid_request("Missing or invalid 'messages' field");
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(
            body["error"]["message"],
            "Missing or invalid 'messages' field"
        );
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn test_upstream_status_is_propagated() {
        let err = GatewayError::Upstream {
            status: 429,
            message: "slow down".into(),
        };
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["type"], "relay_error");
        assert_eq!(body["error"]["message"], "Backend API error: 429 slow down");
    }

    #[test]
    fn test_upstream_invalid_status_becomes_bad_gateway() {
        let err = GatewayError::Upstream {
            status: 42,
            message: "weird".into(),
        };
        assert_eq!(err.status_code(), http::StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_transport_is_relay_error_with_details() {
        let err = GatewayError::Transport("connection refused".into());
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "relay_error");
        assert_eq!(body["error"]["details"], "connection refused");
    }

    #[test]
    fn test_models_fetch_is_relay_error() {
        let err = GatewayError::ModelsFetch("backend returned 503".into());
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "relay_error");
        assert_eq!(
            body["error"]["message"],
            "An error occurred while fetching models: backend returned 503"
        );
    }

    #[test]
    fn test_internal_is_server_error() {
        let err = GatewayError::internal("Error reading response body", "eof");
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "server_error");
        assert_eq!(body["error"]["details"], "eof");
    }
}
