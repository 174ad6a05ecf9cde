mod models_cache;
mod request_id;

pub use models_cache::{ModelsCache, RefreshGuard};

use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::protocol::openai_chat::RESPONSE_ID_PREFIX;
use crate::transport::{HttpTransport, PreparedBackend};
use crate::util::unix_now_secs;

use models_cache::fetch_backend_models;
use request_id::RequestIdGenerator;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub transport: HttpTransport,
    pub backend: PreparedBackend,
    models: ModelsCache,
    request_ids: RequestIdGenerator,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, transport: HttpTransport, backend: PreparedBackend) -> Self {
        let models = ModelsCache::new(&config.models, config.server.models_cache_ttl_secs);
        Self {
            config,
            transport,
            backend,
            models,
            request_ids: RequestIdGenerator::new(),
        }
    }

    #[must_use]
    pub fn models(&self) -> &ModelsCache {
        &self.models
    }

    /// `chatcmpl-<uuid>`, one per outbound response.
    #[must_use]
    pub fn next_response_id(&self) -> String {
        let uuid = self.request_ids.next_uuid();
        let mut out = String::with_capacity(RESPONSE_ID_PREFIX.len() + 36);
        out.push_str(RESPONSE_ID_PREFIX);
        out.push_str(uuid.hyphenated().encode_lower(&mut uuid::Uuid::encode_buffer()));
        out
    }

    /// Fresh backend conversation id.
    #[must_use]
    pub fn new_thread_id(&self) -> String {
        self.request_ids.next_uuid().hyphenated().to_string()
    }

    /// Refresh the models cache if its TTL has elapsed.
    ///
    /// Only one caller performs the fetch; others return immediately and
    /// keep using the current entries.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ModelsFetch`] when this caller ran the refresh
    /// and it failed. Stale entries stay in place.
    pub async fn maybe_refresh_models_cache(&self) -> Result<(), GatewayError> {
        if self.backend.models_url().is_none() {
            return Ok(());
        }
        let Some(_slot) = self.models.try_begin_refresh(unix_now_secs()) else {
            return Ok(());
        };
        self.refresh_models_locked().await
    }

    /// Refresh the models cache now, ignoring the TTL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ModelsFetch`] when the fetch fails.
    pub async fn force_refresh_models(&self) -> Result<(), GatewayError> {
        if self.backend.models_url().is_none() {
            tracing::info!("no backend models_url configured, keeping static model list");
            return Ok(());
        }
        let Some(_slot) = self.models.try_begin_forced_refresh(unix_now_secs()) else {
            tracing::debug!("models refresh already in flight");
            return Ok(());
        };
        self.refresh_models_locked().await
    }

    async fn refresh_models_locked(&self) -> Result<(), GatewayError> {
        let Some(url) = self.backend.models_url() else {
            return Ok(());
        };
        match fetch_backend_models(
            &self.transport,
            &self.backend,
            url,
            &self.config.backend.default_provider,
        )
        .await
        {
            Ok(entries) => {
                let fetched = entries.len();
                self.models.replace(entries);
                tracing::info!(fetched, total = self.models.len(), "models cache refreshed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, cached = self.models.len(), "models cache refresh failed");
                Err(err)
            }
        }
    }
}
