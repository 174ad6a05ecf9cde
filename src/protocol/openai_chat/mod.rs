pub mod response_encoder;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";
pub const CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const RESPONSE_ID_PREFIX: &str = "chatcmpl-";

/// `OpenAI` Chat Completion request wire type.
///
/// Fields outside the known set are kept, in arrival order, in `extra`. A
/// known field with an unexpected JSON type is kept there too instead of
/// failing the whole request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Move `key` out of `fields` when `convert` accepts its value.
///
/// `null` counts as absent; a value `convert` rejects stays in `fields`.
fn take_field<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.get(key)?;
    if value.is_null() {
        fields.shift_remove(key);
        return None;
    }
    let converted = convert(value)?;
    fields.shift_remove(key);
    Some(converted)
}

#[allow(clippy::cast_possible_truncation)]
fn token_limit(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|n| n.is_finite()).map(|n| n as i64))
}

impl<'de> Deserialize<'de> for ChatCompletionRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        let messages = take_field(&mut extra, "messages", |value| {
            serde_json::from_value::<Vec<ChatMessage>>(value.clone()).ok()
        })
        .unwrap_or_default();
        let model = take_field(&mut extra, "model", |v| v.as_str().map(str::to_owned));
        let temperature = take_field(&mut extra, "temperature", Value::as_f64);
        let stream = take_field(&mut extra, "stream", Value::as_bool);
        let system = take_field(&mut extra, "system", |v| v.as_str().map(str::to_owned));
        let max_tokens = take_field(&mut extra, "max_tokens", token_limit);
        let top_p = take_field(&mut extra, "top_p", Value::as_f64);
        let frequency_penalty = take_field(&mut extra, "frequency_penalty", Value::as_f64);
        let presence_penalty = take_field(&mut extra, "presence_penalty", Value::as_f64);

        Ok(Self {
            messages,
            model,
            temperature,
            stream,
            system,
            max_tokens,
            top_p,
            frequency_penalty,
            presence_penalty,
            extra,
        })
    }
}

impl ChatCompletionRequest {
    #[must_use]
    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Requested model, ignoring an empty string.
    #[must_use]
    pub fn requested_model(&self) -> Option<&str> {
        self.model.as_deref().filter(|model| !model.is_empty())
    }

    /// Custom system instruction, ignoring an empty string.
    #[must_use]
    pub fn system_instruction(&self) -> Option<&str> {
        self.system.as_deref().filter(|system| !system.is_empty())
    }
}

/// One inbound chat turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
}

/// Message content: plain text, a list of typed parts, or anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
    Other(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Other(Value::Null)
    }
}

/// `OpenAI` Chat Completion response wire type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ResponseChoice>,
    pub usage: Usage,
    pub service_tier: String,
    pub system_fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseChoice {
    pub index: u32,
    pub message: ResponseMessage,
    pub logprobs: Option<Value>,
    pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: String,
    pub refusal: Option<String>,
    pub annotations: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub prompt_tokens_details: PromptTokensDetails,
    pub completion_tokens_details: CompletionTokensDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTokensDetails {
    pub cached_tokens: u64,
    pub audio_tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionTokensDetails {
    pub reasoning_tokens: u64,
    pub audio_tokens: u64,
    pub accepted_prediction_tokens: u64,
    pub rejected_prediction_tokens: u64,
}

/// One outbound streaming chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    /// Empty string when the backend reported no terminal reason.
    pub finish_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDelta {
    pub content: String,
}

/// `GET /v1/models` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCard {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub owned_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_keeps_unknown_fields_in_order() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "zeta": 1,
            "model": "x",
            "alpha": {"nested": true},
            "user": "abc"
        }))
        .unwrap();
        assert_eq!(req.requested_model(), Some("x"));
        let keys: Vec<&str> = req.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "user"]);
    }

    #[test]
    fn test_request_defaults() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert!(!req.wants_stream());
        assert!(req.requested_model().is_none());
        assert!(req.temperature.is_none());
        assert!(req.max_tokens.is_none());
        assert!(req.extra.is_empty());
    }

    #[test]
    fn test_empty_model_and_system_are_ignored() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [],
            "model": "",
            "system": ""
        }))
        .unwrap();
        assert!(req.requested_model().is_none());
        assert!(req.system_instruction().is_none());
    }

    #[test]
    fn test_float_max_tokens_is_truncated() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 100.0
        }))
        .unwrap();
        assert_eq!(req.max_tokens, Some(100));
        let req: ChatCompletionRequest =
            serde_json::from_str(r#"{"messages":[],"max_tokens":64.9}"#).unwrap();
        assert_eq!(req.max_tokens, Some(64));
    }

    #[test]
    fn test_mistyped_known_fields_move_to_extra() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": "0.7",
            "stream": "yes",
            "model": 42,
            "top_p": 0.9
        }))
        .unwrap();
        assert!(req.temperature.is_none());
        assert!(!req.wants_stream());
        assert!(req.requested_model().is_none());
        assert_eq!(req.top_p, Some(0.9));
        assert_eq!(req.messages.len(), 1);
        let keys: Vec<&str> = req.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["temperature", "stream", "model"]);
        assert_eq!(req.extra["temperature"], "0.7");
    }

    #[test]
    fn test_null_known_fields_are_absent() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": null,
            "max_tokens": null
        }))
        .unwrap();
        assert!(req.temperature.is_none());
        assert!(req.max_tokens.is_none());
        assert!(req.extra.is_empty());
    }

    #[test]
    fn test_invalid_messages_leave_request_empty() {
        let req: ChatCompletionRequest =
            serde_json::from_value(json!({"messages": "hello", "model": "x"})).unwrap();
        assert!(req.messages.is_empty());
        assert_eq!(req.extra["messages"], "hello");
        assert!(serde_json::from_str::<ChatCompletionRequest>("[1, 2]").is_err());
    }

    #[test]
    fn test_message_content_shapes() {
        let msgs: Vec<ChatMessage> = serde_json::from_value(json!([
            {"role": "user", "content": "plain"},
            {"role": "user", "content": [{"type": "text", "text": "a"}, 3]},
            {"role": "user", "content": {"weird": true}},
            {"role": "user"}
        ]))
        .unwrap();
        assert_eq!(msgs[0].content, MessageContent::Text("plain".into()));
        assert!(matches!(msgs[1].content, MessageContent::Parts(ref parts) if parts.len() == 2));
        assert!(matches!(msgs[2].content, MessageContent::Other(_)));
        assert_eq!(msgs[3].content, MessageContent::default());
    }
}
