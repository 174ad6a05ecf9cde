use bytes::Bytes;
use serde::Serialize;

use crate::config::DefaultsConfig;
use crate::error::GatewayError;
use crate::protocol::backend::BackendEvent;
use crate::routing::ProviderEntry;
use crate::stream::sse::openai_sse_frame;

use super::{
    ChatCompletionChunk, ChatCompletionResponse, ChunkChoice, ChunkDelta, ModelCard, ModelList,
    ResponseChoice, ResponseMessage, Usage, CHAT_COMPLETION_CHUNK_OBJECT, CHAT_COMPLETION_OBJECT,
};

/// Build the single-choice non-streaming response document.
#[must_use]
pub fn build_chat_completion(
    id: &str,
    created: u64,
    model: &str,
    text: String,
    finish_reason: &str,
    defaults: &DefaultsConfig,
) -> ChatCompletionResponse {
    let usage = Usage {
        prompt_tokens: defaults.usage.prompt_tokens,
        completion_tokens: defaults.usage.completion_tokens,
        total_tokens: defaults.usage.prompt_tokens + defaults.usage.completion_tokens,
        ..Usage::default()
    };

    ChatCompletionResponse {
        id: id.to_string(),
        object: CHAT_COMPLETION_OBJECT.to_string(),
        created,
        model: model.to_string(),
        choices: vec![ResponseChoice {
            index: 0,
            message: ResponseMessage {
                role: "assistant".to_string(),
                content: text,
                refusal: None,
                annotations: Vec::new(),
            },
            logprobs: None,
            finish_reason: finish_reason.to_string(),
        }],
        usage,
        service_tier: defaults.service_tier.clone(),
        system_fingerprint: defaults.system_fingerprint.clone(),
    }
}

/// Pretty-printed JSON followed by a newline.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] when serialization fails.
pub fn encode_pretty_json<T: Serialize>(value: &T) -> Result<Bytes, GatewayError> {
    let mut out = serde_json::to_vec_pretty(value)
        .map_err(|e| GatewayError::internal("Failed to marshal response", e))?;
    out.push(b'\n');
    Ok(Bytes::from(out))
}

/// Build one outbound chunk from a backend event.
#[must_use]
pub fn build_chunk(id: &str, created: u64, model: &str, event: &BackendEvent) -> ChatCompletionChunk {
    ChatCompletionChunk {
        id: id.to_string(),
        object: CHAT_COMPLETION_CHUNK_OBJECT.to_string(),
        created,
        model: model.to_string(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: ChunkDelta {
                content: event.text.clone().unwrap_or_default(),
            },
            finish_reason: event.finish_reason.clone().unwrap_or_default(),
        }],
    }
}

/// Serialize a chunk as a complete `data: <json>\n\n` frame.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] when serialization fails.
pub fn encode_chunk_frame(chunk: &ChatCompletionChunk) -> Result<Bytes, GatewayError> {
    let json = serde_json::to_string(chunk)
        .map_err(|e| GatewayError::internal("Failed to marshal chunk", e))?;
    Ok(Bytes::from(openai_sse_frame(&json)))
}

/// Model listing sorted by id, regardless of resolver order.
#[must_use]
pub fn build_model_list(mut entries: Vec<ProviderEntry>, created: u64) -> ModelList {
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    ModelList {
        object: "list".to_string(),
        data: entries
            .into_iter()
            .map(|entry| ModelCard {
                id: entry.id,
                object: "model".to_string(),
                created,
                owned_by: entry.provider,
            })
            .collect(),
    }
}
