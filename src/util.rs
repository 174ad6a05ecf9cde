use std::time::{SystemTime, UNIX_EPOCH};

const MAX_ERROR_MESSAGE_CHARS: usize = 500;

#[inline]
pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Short, single-line rendering of a backend error body.
///
/// JSON bodies are re-serialized compactly; anything else is decoded lossily.
/// The result is truncated on a character boundary.
pub(crate) fn sanitize_backend_error(body: &[u8]) -> String {
    let text = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    truncate_chars(text, MAX_ERROR_MESSAGE_CHARS)
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            let mut out = text[..cut].to_string();
            out.push_str("...");
            out
        }
        None => text,
    }
}
