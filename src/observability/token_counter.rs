use std::time::Duration;
use tracing::info;

/// Estimate the number of tokens in `text`.
///
/// Uses a lightweight heuristic (`bytes / 4`) to avoid loading model BPE tables.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Log output size and an estimated completion token count.
///
/// The backend reports no usage, so the estimate is the only signal of how
/// much was generated.
pub fn log_completion_usage(
    model: &str,
    stream: bool,
    fragments: usize,
    text: &str,
    elapsed: Duration,
) {
    info!(
        model = model,
        stream = stream,
        fragments = fragments,
        output_chars = text.chars().count(),
        estimated_completion_tokens = estimate_tokens(text),
        duration_ms = elapsed.as_millis(),
        "Request complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
