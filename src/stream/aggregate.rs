use tracing::{info, warn};

use super::extract::{extract_event, first_non_empty_str, BODY_FALLBACK_POINTERS};
use super::{Accumulator, DataLineParser};

/// Where the aggregated answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationSource {
    EventStream,
    WholeBody,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub text: String,
    /// Last terminal reason seen in the event stream, if any.
    pub finish_reason: Option<String>,
    pub fragments: usize,
    pub source: AggregationSource,
}

/// Drain a complete backend body into one answer.
///
/// Event lines win; a body that is one JSON document is searched next; the
/// placeholder is used when both come up empty.
#[must_use]
pub fn aggregate_body(body: &[u8], placeholder: &str) -> Aggregation {
    let mut parser = DataLineParser::new();
    let mut payloads = Vec::new();
    parser.feed_into(body, &mut payloads);
    parser.finish_into(&mut payloads);

    let mut accumulator = Accumulator::new();
    for payload in &payloads {
        accumulator.push(&extract_event(payload));
    }

    let (text, finish_reason, fragments) = accumulator.into_parts();
    if !text.is_empty() {
        return Aggregation {
            text,
            finish_reason,
            fragments,
            source: AggregationSource::EventStream,
        };
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(text) = first_non_empty_str(&value, &BODY_FALLBACK_POINTERS) {
            info!(
                chars = text.len(),
                "no event text in backend body, recovered answer from whole-body JSON"
            );
            return Aggregation {
                text: text.to_string(),
                finish_reason,
                fragments,
                source: AggregationSource::WholeBody,
            };
        }
    }

    warn!(
        body_len = body.len(),
        "could not extract any text from backend body, returning placeholder"
    );
    Aggregation {
        text: placeholder.to_string(),
        finish_reason,
        fragments,
        source: AggregationSource::Placeholder,
    }
}
