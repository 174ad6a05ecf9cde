pub mod validation;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use self::validation::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Overall backend request timeout in seconds, covering the full body read.
    pub timeout: u64,
    pub http_pool_max_idle_per_host: usize,
    pub http_pool_idle_timeout_secs: u64,
    pub models_cache_ttl_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_worker_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_max_blocking_threads: Option<usize>,
    pub base_path: String,
    pub http_use_env_proxy: bool,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_timeout() -> u64 {
    300
}
fn default_http_pool_max_idle_per_host() -> usize {
    16
}
fn default_http_pool_idle_timeout_secs() -> u64 {
    15
}
fn default_models_cache_ttl_secs() -> u64 {
    600
}

#[derive(Debug, Deserialize)]
struct ServerConfigWire {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_timeout")]
    timeout: u64,
    #[serde(default = "default_http_pool_max_idle_per_host")]
    http_pool_max_idle_per_host: usize,
    #[serde(default = "default_http_pool_idle_timeout_secs")]
    http_pool_idle_timeout_secs: u64,
    #[serde(default = "default_models_cache_ttl_secs")]
    models_cache_ttl_secs: u64,
    #[serde(default)]
    runtime_worker_threads: Option<RuntimeThreadsSetting>,
    #[serde(default)]
    runtime_max_blocking_threads: Option<RuntimeThreadsSetting>,
    #[serde(default)]
    base_path: String,
    #[serde(default)]
    http_use_env_proxy: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuntimeThreadsSetting {
    Fixed(usize),
    Auto(()),
}

fn runtime_threads_or_default(
    setting: Option<&RuntimeThreadsSetting>,
    default: Option<usize>,
) -> Option<usize> {
    match setting {
        None => default,
        Some(RuntimeThreadsSetting::Fixed(threads)) => Some(*threads),
        Some(RuntimeThreadsSetting::Auto(())) => None,
    }
}

impl<'de> Deserialize<'de> for ServerConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = ServerConfigWire::deserialize(deserializer)?;
        Ok(Self {
            port: wire.port,
            host: wire.host,
            timeout: wire.timeout,
            http_pool_max_idle_per_host: wire.http_pool_max_idle_per_host,
            http_pool_idle_timeout_secs: wire.http_pool_idle_timeout_secs,
            models_cache_ttl_secs: wire.models_cache_ttl_secs,
            // missing => default, explicit null => runtime decides
            runtime_worker_threads: runtime_threads_or_default(
                wire.runtime_worker_threads.as_ref(),
                None,
            ),
            runtime_max_blocking_threads: runtime_threads_or_default(
                wire.runtime_max_blocking_threads.as_ref(),
                Some(8),
            ),
            base_path: wire.base_path,
            http_use_env_proxy: wire.http_use_env_proxy,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            timeout: default_timeout(),
            http_pool_max_idle_per_host: default_http_pool_max_idle_per_host(),
            http_pool_idle_timeout_secs: default_http_pool_idle_timeout_secs(),
            models_cache_ttl_secs: default_models_cache_ttl_secs(),
            runtime_worker_threads: None,
            runtime_max_blocking_threads: Some(8),
            base_path: String::new(),
            http_use_env_proxy: false,
        }
    }
}

/// Backend chat API endpoint and request constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub chat_url: String,
    #[serde(default)]
    pub models_url: Option<String>,
    #[serde(default)]
    pub api_token: String,
    /// Extra static headers sent with every backend request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_source")]
    pub source: String,
    /// Provider reported when a model cannot be resolved through the cache.
    #[serde(default = "default_provider")]
    pub default_provider: String,
}

fn default_locale() -> String {
    "en-US".to_string()
}
fn default_source() -> String {
    "ai_chat".to_string()
}
fn default_provider() -> String {
    "openai".to_string()
}

/// A backend tool enabled for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendToolConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// Synthetic usage counters reported on non-streaming responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "default_usage_tokens")]
    pub prompt_tokens: u64,
    #[serde(default = "default_usage_tokens")]
    pub completion_tokens: u64,
}

fn default_usage_tokens() -> u64 {
    10
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            prompt_tokens: default_usage_tokens(),
            completion_tokens: default_usage_tokens(),
        }
    }
}

/// Values applied when the inbound request leaves something unspecified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    #[serde(default)]
    pub additional_system_instructions: String,
    #[serde(default)]
    pub tools: Vec<BackendToolConfig>,
    #[serde(default = "default_fallback_finish_reason")]
    pub fallback_finish_reason: String,
    #[serde(default = "default_service_tier")]
    pub service_tier: String,
    #[serde(default = "default_system_fingerprint")]
    pub system_fingerprint: String,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default = "default_extraction_failed_notice")]
    pub extraction_failed_notice: String,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f64 {
    0.5
}
fn default_system_instruction() -> String {
    "markdown".to_string()
}
fn default_fallback_finish_reason() -> String {
    "length".to_string()
}
fn default_service_tier() -> String {
    "default".to_string()
}
fn default_system_fingerprint() -> String {
    "fp_b376dfbbd5".to_string()
}
fn default_extraction_failed_notice() -> String {
    "Sorry, the response content could not be extracted. Please resend the request or ask the administrator to check the server logs.".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            system_instruction: default_system_instruction(),
            additional_system_instructions: String::new(),
            tools: Vec::new(),
            fallback_finish_reason: default_fallback_finish_reason(),
            service_tier: default_service_tier(),
            system_fingerprint: default_system_fingerprint(),
            usage: UsageConfig::default(),
            extraction_failed_notice: default_extraction_failed_notice(),
        }
    }
}

/// Statically configured model entry used to seed the models cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSeedConfig {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    pub provider: String,
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub models: Vec<ModelSeedConfig>,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] when parsing fails or [`ConfigError::Validation`]
/// when semantic validation fails.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_yaml::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_example_config() {
        let config = load_config("config.example.yaml");
        assert!(
            config.is_ok(),
            "Failed to load example config: {:?}",
            config.err()
        );
        let config = config.unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.timeout, 300);
        assert!(!config.server.http_use_env_proxy);
        assert_eq!(config.backend.locale, "en-US");
        assert_eq!(config.backend.source, "ai_chat");
        assert!(config.backend.models_url.is_some());
        assert!(config.models.len() >= 2);
        assert!(config.defaults.tools.is_empty());
    }

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = parse_config("backend:\n  chat_url: https://backend.example.com/chat\n")
            .expect("minimal config");
        assert_eq!(config.defaults.model, "gpt-4o-mini");
        assert!((config.defaults.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.defaults.system_instruction, "markdown");
        assert_eq!(config.defaults.fallback_finish_reason, "length");
        assert_eq!(config.defaults.usage, UsageConfig::default());
        assert_eq!(config.backend.default_provider, "openai");
        assert_eq!(config.features.log_level, "INFO");
        assert!(config.models.is_empty());
    }

    #[test]
    fn test_server_config_runtime_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.runtime_worker_threads, None);
        assert_eq!(server.runtime_max_blocking_threads, Some(8));
        assert_eq!(server.models_cache_ttl_secs, 600);
    }

    #[test]
    fn test_server_config_fixed_threads() {
        let server: ServerConfig =
            serde_yaml::from_str("runtime_worker_threads: 2\nport: 9100\n").unwrap();
        assert_eq!(server.runtime_worker_threads, Some(2));
        assert_eq!(server.runtime_max_blocking_threads, Some(8));
        assert_eq!(server.port, 9100);
        assert_eq!(server.timeout, 300);
    }

    #[test]
    fn test_backend_tool_type_rename() {
        let tool: BackendToolConfig =
            serde_yaml::from_str("name: web_search\ntype: remote_tool\n").unwrap();
        assert_eq!(tool.type_, "remote_tool");
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["type"], "remote_tool");
    }
}
