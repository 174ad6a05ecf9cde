pub mod encoder;

use serde::{Deserialize, Serialize};

/// Author of a backend chat turn. The backend has no system author; system
/// text travels in [`BackendChatRequest::system_instruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendAuthor {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendMessage {
    pub author: BackendAuthor,
    pub content: BackendContent,
}

impl BackendMessage {
    #[must_use]
    pub fn new(author: BackendAuthor, text: String) -> Self {
        Self {
            author,
            content: BackendContent { text },
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.content.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTool {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
}

/// Backend chat request wire type. Field order matches the backend schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendChatRequest {
    pub additional_system_instructions: String,
    pub debug: bool,
    pub locale: String,
    pub messages: Vec<BackendMessage>,
    pub model: String,
    pub provider: String,
    pub source: String,
    pub system_instruction: String,
    pub temperature: f64,
    pub thread_id: String,
    pub tools: Vec<BackendTool>,
}

/// The documented backend event payload: `{"text": ..., "finish_reason": ...}`.
///
/// Any other field makes the strict parse fail so the extractor moves on to
/// its permissive strategies.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BackendSseData {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One parsed backend event: an optional text fragment and an optional
/// terminal reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendEvent {
    pub text: Option<String>,
    pub finish_reason: Option<String>,
}

impl BackendEvent {
    #[must_use]
    pub fn fragment(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.finish_reason.is_none()
    }
}
