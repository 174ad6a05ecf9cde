use std::collections::HashSet;

use super::{AppConfig, ConfigError};

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_backend_config(config)?;
    validate_defaults(config)?;
    validate_model_seeds(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.timeout == 0 {
        return Err(validation_err("server.timeout must be greater than 0"));
    }
    if server.http_pool_max_idle_per_host == 0 {
        return Err(validation_err(
            "server.http_pool_max_idle_per_host must be greater than 0",
        ));
    }
    if let Some(worker_threads) = server.runtime_worker_threads {
        if worker_threads == 0 {
            return Err(validation_err(
                "server.runtime_worker_threads must be greater than 0 when set",
            ));
        }
    }
    if let Some(max_blocking_threads) = server.runtime_max_blocking_threads {
        if max_blocking_threads == 0 {
            return Err(validation_err(
                "server.runtime_max_blocking_threads must be greater than 0 when set",
            ));
        }
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_backend_config(config: &AppConfig) -> Result<(), ConfigError> {
    let backend = &config.backend;
    if !is_http_url(&backend.chat_url) {
        return Err(validation_err(
            "backend.chat_url must start with http:// or https://",
        ));
    }
    if let Some(models_url) = backend.models_url.as_deref() {
        if !is_http_url(models_url) {
            return Err(validation_err(
                "backend.models_url must start with http:// or https://",
            ));
        }
    }
    if backend.default_provider.trim().is_empty() {
        return Err(validation_err("backend.default_provider cannot be empty"));
    }
    for name in backend.headers.keys() {
        if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(validation_err(format!(
                "backend.headers contains an invalid header name '{name}'"
            )));
        }
    }
    Ok(())
}

fn validate_defaults(config: &AppConfig) -> Result<(), ConfigError> {
    let defaults = &config.defaults;
    if defaults.model.trim().is_empty() {
        return Err(validation_err("defaults.model cannot be empty"));
    }
    if !(0.0..=2.0).contains(&defaults.temperature) {
        return Err(validation_err(
            "defaults.temperature must be between 0.0 and 2.0",
        ));
    }
    if defaults.fallback_finish_reason.trim().is_empty() {
        return Err(validation_err(
            "defaults.fallback_finish_reason cannot be empty",
        ));
    }
    if defaults.extraction_failed_notice.trim().is_empty() {
        return Err(validation_err(
            "defaults.extraction_failed_notice cannot be empty",
        ));
    }
    for tool in &defaults.tools {
        if tool.name.trim().is_empty() || tool.type_.trim().is_empty() {
            return Err(validation_err(
                "defaults.tools entries need a non-empty name and type",
            ));
        }
    }
    Ok(())
}

fn validate_model_seeds(config: &AppConfig) -> Result<(), ConfigError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for seed in &config.models {
        let id = seed.id.trim();
        if id.is_empty() {
            return Err(validation_err("models contains an entry with an empty id"));
        }
        if seed.provider.trim().is_empty() {
            return Err(validation_err(format!(
                "Model '{id}': provider cannot be empty"
            )));
        }
        if !seen.insert(id) {
            return Err(validation_err(format!("Duplicate model id '{id}'")));
        }
    }
    Ok(())
}

const VALID_LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let level = config.features.log_level.to_uppercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "Invalid log_level '{}'. Must be one of: {}",
            config.features.log_level,
            VALID_LOG_LEVELS.join(", ")
        )));
    }
    Ok(())
}
