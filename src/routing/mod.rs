pub mod dispatch;

use tracing::{info, warn};

/// A public model id and the backend (provider, model) pair it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    pub id: String,
    pub model: String,
    pub provider: String,
}

impl ProviderEntry {
    #[must_use]
    pub fn new(id: impl Into<String>, model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            provider: provider.into(),
        }
    }
}

/// Lookup from public model name to backend provider information.
///
/// Implementations own their freshness; lookups never block on I/O.
pub trait ProviderResolver {
    fn resolve(&self, model: &str) -> Option<ProviderEntry>;

    /// Every known entry, in no particular order.
    fn list_models(&self) -> Vec<ProviderEntry>;
}

/// Resolve `requested`, falling back to the default model's entry and then
/// to `(default_provider, requested)`. Never fails.
pub fn resolve_or_default<R: ProviderResolver + ?Sized>(
    resolver: &R,
    requested: &str,
    default_model: &str,
    default_provider: &str,
) -> ProviderEntry {
    if let Some(entry) = resolver.resolve(requested) {
        return entry;
    }

    if requested != default_model {
        if let Some(entry) = resolver.resolve(default_model) {
            warn!(
                requested,
                fallback = %entry.id,
                "unknown model, using default model"
            );
            return entry;
        }
    }

    info!(
        requested,
        provider = default_provider,
        "model not in cache, passing through with default provider"
    );
    ProviderEntry::new(requested, requested, default_provider)
}
