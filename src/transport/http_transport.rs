use std::time::Duration;

use crate::config::ServerConfig;
use crate::error::GatewayError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn build_reqwest_client(
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Option<Duration>,
    timeout: Duration,
    use_env_proxy: bool,
) -> Result<reqwest::Client, GatewayError> {
    let mut builder = reqwest::Client::builder()
        .pool_max_idle_per_host(pool_max_idle_per_host)
        .pool_idle_timeout(pool_idle_timeout)
        .tcp_nodelay(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout);

    if !use_env_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|err| GatewayError::Config(format!("Failed to build HTTP client: {err}")))
}

/// HTTP client for the backend, shared by every request.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with connection pooling and timeouts from the
    /// server config.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] when the TLS backend or client
    /// cannot be initialised.
    pub fn new(config: &ServerConfig) -> Result<Self, GatewayError> {
        let pool_idle_timeout = match config.http_pool_idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let client = build_reqwest_client(
            config.http_pool_max_idle_per_host.max(1),
            pool_idle_timeout,
            Duration::from_secs(config.timeout),
            config.http_use_env_proxy,
        )?;
        Ok(Self { client })
    }

    /// Send one request to the backend.
    ///
    /// The returned response has not been checked for status; its body is
    /// still unread.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] when the URL is invalid or the
    /// request cannot be sent.
    pub async fn send_request(
        &self,
        url: &str,
        method: http::Method,
        headers: &http::HeaderMap,
        body: bytes::Bytes,
    ) -> Result<reqwest::Response, GatewayError> {
        let started = std::time::Instant::now();
        let response = self
            .client
            .request(method, url)
            .headers(headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        tracing::debug!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "backend responded"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_builds_from_default_config() {
        assert!(HttpTransport::new(&ServerConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let transport = HttpTransport::new(&ServerConfig::default()).unwrap();
        let err = transport
            .send_request(
                "not a url",
                http::Method::GET,
                &http::HeaderMap::new(),
                bytes::Bytes::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }
}
