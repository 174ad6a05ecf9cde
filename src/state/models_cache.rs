use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::Bytes;
use http::Method;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config::ModelSeedConfig;
use crate::error::GatewayError;
use crate::routing::{ProviderEntry, ProviderResolver};
use crate::transport::{HttpTransport, PreparedBackend};

/// Public model id -> backend provider entry, refreshed on a TTL.
pub struct ModelsCache {
    entries: RwLock<BTreeMap<String, ProviderEntry>>,
    seeds: Vec<ProviderEntry>,
    ttl_secs: u64,
    next_refresh_unix: AtomicU64,
    refreshing: AtomicBool,
}

impl ModelsCache {
    #[must_use]
    pub fn new(seeds: &[ModelSeedConfig], ttl_secs: u64) -> Self {
        let seeds: Vec<ProviderEntry> = seeds
            .iter()
            .map(|seed| {
                ProviderEntry::new(
                    seed.id.clone(),
                    seed.model.clone().unwrap_or_else(|| seed.id.clone()),
                    seed.provider.clone(),
                )
            })
            .collect();
        let entries = merge_entries(&seeds, Vec::new());
        Self {
            entries: RwLock::new(entries),
            seeds,
            ttl_secs,
            next_refresh_unix: AtomicU64::new(0),
            refreshing: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Replace the cached entries with the seeds plus `fetched`. Seeds win on
    /// id collisions.
    pub fn replace(&self, fetched: Vec<ProviderEntry>) {
        let merged = merge_entries(&self.seeds, fetched);
        *self.entries.write() = merged;
    }

    /// Claim the refresh slot if the TTL has elapsed and nobody else holds it.
    ///
    /// The slot is released when the returned guard drops, including when the
    /// refreshing future is cancelled mid-fetch.
    #[must_use]
    pub fn try_begin_refresh(&self, now: u64) -> Option<RefreshGuard<'_>> {
        if self.ttl_secs == 0 {
            return None;
        }

        let next = self.next_refresh_unix.load(Ordering::Relaxed);
        if now < next {
            return None;
        }
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return None;
        }

        self.next_refresh_unix
            .store(now.saturating_add(self.ttl_secs), Ordering::Relaxed);
        Some(RefreshGuard { cache: self })
    }

    /// Claim the refresh slot regardless of the TTL.
    #[must_use]
    pub fn try_begin_forced_refresh(&self, now: u64) -> Option<RefreshGuard<'_>> {
        if self.refreshing.swap(true, Ordering::AcqRel) {
            return None;
        }
        self.next_refresh_unix
            .store(now.saturating_add(self.ttl_secs), Ordering::Relaxed);
        Some(RefreshGuard { cache: self })
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }
}

/// Holds the single refresh slot of a [`ModelsCache`].
#[must_use = "dropping the guard releases the refresh slot"]
pub struct RefreshGuard<'a> {
    cache: &'a ModelsCache,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.cache.refreshing.store(false, Ordering::Release);
    }
}

impl ProviderResolver for ModelsCache {
    fn resolve(&self, model: &str) -> Option<ProviderEntry> {
        let entries = self.entries.read();
        if let Some(entry) = entries.get(model) {
            return Some(entry.clone());
        }
        // clients sometimes send the backend's own model name
        entries.values().find(|entry| entry.model == model).cloned()
    }

    fn list_models(&self) -> Vec<ProviderEntry> {
        self.entries.read().values().cloned().collect()
    }
}

fn merge_entries(
    seeds: &[ProviderEntry],
    fetched: Vec<ProviderEntry>,
) -> BTreeMap<String, ProviderEntry> {
    let mut entries = BTreeMap::new();
    for seed in seeds {
        entries.insert(seed.id.clone(), seed.clone());
    }
    for entry in fetched {
        entries.entry(entry.id.clone()).or_insert(entry);
    }
    entries
}

/// Fetch the backend model catalogue.
///
/// # Errors
///
/// Returns [`GatewayError::ModelsFetch`] when the request fails, the backend
/// answers with a non-success status, or the payload lists no models.
pub(crate) async fn fetch_backend_models(
    transport: &HttpTransport,
    backend: &PreparedBackend,
    url: &str,
    default_provider: &str,
) -> Result<Vec<ProviderEntry>, GatewayError> {
    let response = transport
        .send_request(url, Method::GET, backend.models_headers(), Bytes::new())
        .await
        .map_err(|err| GatewayError::ModelsFetch(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::ModelsFetch(format!(
            "backend returned status {}",
            status.as_u16()
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|err| GatewayError::ModelsFetch(err.to_string()))?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|err| GatewayError::ModelsFetch(format!("invalid models payload: {err}")))?;
    let entries = extract_entries_from_payload(&payload, default_provider);
    if entries.is_empty() {
        return Err(GatewayError::ModelsFetch(
            "backend returned no models".to_string(),
        ));
    }
    Ok(entries)
}

/// Accepts `{"models": [...]}` and `{"data": [...]}` catalogues.
pub(crate) fn extract_entries_from_payload(payload: &Value, default_provider: &str) -> Vec<ProviderEntry> {
    let mut out = Vec::new();
    for key in ["models", "data"] {
        let Some(items) = payload.get(key).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            if let Some(entry) = entry_from_item(item, default_provider) {
                out.push(entry);
            }
        }
    }
    out
}

fn entry_from_item(item: &Value, default_provider: &str) -> Option<ProviderEntry> {
    let str_field = |name: &str| {
        item.get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let id = str_field("id").or_else(|| str_field("name"))?;
    let model = str_field("model").unwrap_or(id);
    let provider = str_field("provider")
        .or_else(|| str_field("owned_by"))
        .unwrap_or(default_provider);
    Some(ProviderEntry::new(id, model, provider))
}
