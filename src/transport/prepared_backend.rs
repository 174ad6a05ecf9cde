use crate::config::BackendConfig;

/// Backend endpoints and static headers, computed once at startup.
#[derive(Debug, Clone)]
pub struct PreparedBackend {
    chat_url: String,
    models_url: Option<String>,
    chat_headers: http::HeaderMap,
    models_headers: http::HeaderMap,
}

impl PreparedBackend {
    #[must_use]
    pub fn new(backend: &BackendConfig) -> Self {
        let common = Self::build_common_headers(backend);

        let mut chat_headers = common.clone();
        chat_headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        chat_headers.insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static("text/event-stream"),
        );

        let mut models_headers = common;
        models_headers.insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static("application/json"),
        );

        Self {
            chat_url: backend.chat_url.trim().to_string(),
            models_url: backend
                .models_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            chat_headers,
            models_headers,
        }
    }

    #[must_use]
    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    #[must_use]
    pub fn models_url(&self) -> Option<&str> {
        self.models_url.as_deref()
    }

    #[must_use]
    pub fn chat_headers(&self) -> &http::HeaderMap {
        &self.chat_headers
    }

    #[must_use]
    pub fn models_headers(&self) -> &http::HeaderMap {
        &self.models_headers
    }

    fn build_common_headers(backend: &BackendConfig) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();

        for (name, value) in &backend.headers {
            let parsed = (
                http::HeaderName::from_bytes(name.as_bytes()),
                http::HeaderValue::from_str(value),
            );
            match parsed {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping invalid backend header"),
            }
        }

        let token = backend.api_token.trim();
        if !token.is_empty() {
            match http::HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(http::header::AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("backend api_token is not a valid header value, skipping"),
            }
        }

        headers
    }
}
