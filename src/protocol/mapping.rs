//! Inbound chat turns to backend turns.

use super::backend::{BackendAuthor, BackendMessage};
use super::openai_chat::{ChatMessage, MessageContent};

#[must_use]
pub fn openai_role_to_author(role: &str) -> BackendAuthor {
    match role {
        "assistant" => BackendAuthor::Assistant,
        // system content is carried in system_instruction, not as a turn
        _ => BackendAuthor::User,
    }
}

/// Flatten message content into the backend's single text field.
///
/// Only parts shaped `{"type": "text", "text": "..."}` contribute; any other
/// shape yields nothing rather than an error.
#[must_use]
pub fn content_to_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => {
            let mut out = String::new();
            for part in parts {
                if part.get("type").and_then(serde_json::Value::as_str) != Some("text") {
                    continue;
                }
                if let Some(text) = part.get("text").and_then(serde_json::Value::as_str) {
                    out.push_str(text);
                }
            }
            out
        }
        MessageContent::Other(_) => String::new(),
    }
}

/// Convert inbound turns 1:1, preserving order.
#[must_use]
pub fn adapt_messages(messages: &[ChatMessage]) -> Vec<BackendMessage> {
    messages
        .iter()
        .map(|message| {
            BackendMessage::new(
                openai_role_to_author(&message.role),
                content_to_text(&message.content),
            )
        })
        .collect()
}
