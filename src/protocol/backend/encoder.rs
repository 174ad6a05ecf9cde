use bytes::Bytes;

use crate::config::{BackendConfig, DefaultsConfig};
use crate::error::GatewayError;
use crate::protocol::mapping::adapt_messages;
use crate::protocol::openai_chat::ChatCompletionRequest;
use crate::routing::ProviderEntry;

use super::{BackendChatRequest, BackendTool};

/// Build the backend request for an inbound chat completion.
#[must_use]
pub fn build_backend_request(
    request: &ChatCompletionRequest,
    resolved: &ProviderEntry,
    thread_id: String,
    backend: &BackendConfig,
    defaults: &DefaultsConfig,
) -> BackendChatRequest {
    let system_instruction = request
        .system_instruction()
        .unwrap_or(&defaults.system_instruction)
        .to_string();

    BackendChatRequest {
        additional_system_instructions: defaults.additional_system_instructions.clone(),
        debug: false,
        locale: backend.locale.clone(),
        messages: adapt_messages(&request.messages),
        model: resolved.model.clone(),
        provider: resolved.provider.clone(),
        source: backend.source.clone(),
        system_instruction,
        temperature: request.temperature.unwrap_or(defaults.temperature),
        thread_id,
        tools: defaults
            .tools
            .iter()
            .map(|tool| BackendTool {
                name: tool.name.clone(),
                type_: tool.type_.clone(),
            })
            .collect(),
    }
}

/// Serialize the backend request, merging `max_tokens` as an extra top-level
/// field when it is present and positive.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] when serialization fails.
pub fn encode_backend_request(
    request: &BackendChatRequest,
    max_tokens: Option<i64>,
) -> Result<Bytes, GatewayError> {
    let marshal_err = |e: serde_json::Error| GatewayError::internal("Failed to marshal request", e);

    let Some(max_tokens) = max_tokens.filter(|n| *n > 0) else {
        return serde_json::to_vec(request).map(Bytes::from).map_err(marshal_err);
    };

    let mut value = serde_json::to_value(request).map_err(marshal_err)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("max_tokens".to_string(), serde_json::Value::from(max_tokens));
    }
    serde_json::to_vec(&value).map(Bytes::from).map_err(marshal_err)
}
