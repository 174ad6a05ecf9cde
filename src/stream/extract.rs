//! Backend event payload extraction.
//!
//! Strategies run in order and stop at the first success:
//!
//! 1. `[DONE]` sentinel, recognised before parsing.
//! 2. Strict `{text?, finish_reason?}` shape.
//! 3. Any JSON object, searched by pointer for a text fragment.
//!
//! A payload nothing recognises yields an empty event. That is logged and
//! skipped by the caller, never surfaced as an error.

use serde_json::Value;
use tracing::debug;

use crate::protocol::backend::{BackendEvent, BackendSseData};

use super::sse::DONE_SENTINEL;

const EVENT_FALLBACK_POINTERS: [&str; 3] = ["/text", "/content", "/message/content"];

/// Pointers searched when a whole response body is a single JSON document.
pub(crate) const BODY_FALLBACK_POINTERS: [&str; 5] = [
    "/content",
    "/choices/0/message/content",
    "/choices/0/delta/content",
    "/text",
    "/completion",
];

/// First non-empty string found at any of `pointers`, in order.
pub(crate) fn first_non_empty_str<'a>(value: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers
        .iter()
        .filter_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
        .find(|text| !text.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[must_use]
pub fn extract_event(payload: &str) -> BackendEvent {
    let payload = payload.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return BackendEvent::default();
    }

    if let Ok(data) = serde_json::from_str::<BackendSseData>(payload) {
        return BackendEvent {
            text: non_empty(data.text),
            finish_reason: non_empty(data.finish_reason),
        };
    }

    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => {
            debug!(payload_len = payload.len(), "backend event is not a JSON object, skipping");
            return BackendEvent::default();
        }
        Err(e) => {
            debug!(error = %e, payload_len = payload.len(), "backend event is not JSON, skipping");
            return BackendEvent::default();
        }
    };

    let event = BackendEvent {
        text: first_non_empty_str(&value, &EVENT_FALLBACK_POINTERS).map(str::to_owned),
        finish_reason: value
            .get("finish_reason")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned),
    };
    if event.is_empty() {
        debug!(payload_len = payload.len(), "no recognisable content in backend event");
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_shape_with_finish_reason() {
        let event = extract_event(r#"{"text":"hi","finish_reason":"stop"}"#);
        assert_eq!(event.text.as_deref(), Some("hi"));
        assert_eq!(event.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_content_field_reaches_fallback() {
        let event = extract_event(r#"{"content":"hi"}"#);
        assert_eq!(event.text.as_deref(), Some("hi"));
        assert!(event.finish_reason.is_none());
    }

    #[test]
    fn test_unrecognised_object_is_empty() {
        assert!(extract_event(r#"{"foo":"bar"}"#).is_empty());
    }

    #[test]
    fn test_done_sentinel_is_empty() {
        assert!(extract_event("[DONE]").is_empty());
        assert!(extract_event("  [DONE] ").is_empty());
    }

    #[test]
    fn test_non_json_and_non_object_payloads_are_empty() {
        for payload in ["not json", "\"just a string\"", "42", "[1,2]", ""] {
            assert!(extract_event(payload).is_empty(), "{payload}");
        }
    }

    #[test]
    fn test_empty_strict_fields_are_dropped() {
        let event = extract_event(r#"{"text":"","finish_reason":""}"#);
        assert!(event.is_empty());
        let event = extract_event(r#"{"text":null,"finish_reason":"stop"}"#);
        assert!(event.text.is_none());
        assert_eq!(event.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_fallback_pointer_order_and_finish_reason() {
        let event = extract_event(
            r#"{"text":"","content":"second","message":{"content":"third"},"finish_reason":"stop","id":1}"#,
        );
        assert_eq!(event.text.as_deref(), Some("second"));
        assert_eq!(event.finish_reason.as_deref(), Some("stop"));

        let event = extract_event(r#"{"message":{"content":"nested"}}"#);
        assert_eq!(event.text.as_deref(), Some("nested"));
    }

    #[test]
    fn test_body_pointers() {
        let body = json!({"choices": [{"message": {"content": "from choices"}}]});
        assert_eq!(
            first_non_empty_str(&body, &BODY_FALLBACK_POINTERS),
            Some("from choices")
        );
        let body = json!({"content": "", "completion": "legacy"});
        assert_eq!(
            first_non_empty_str(&body, &BODY_FALLBACK_POINTERS),
            Some("legacy")
        );
        assert_eq!(first_non_empty_str(&json!({}), &BODY_FALLBACK_POINTERS), None);
    }
}
