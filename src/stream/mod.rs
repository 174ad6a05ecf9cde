pub mod aggregate;
pub mod extract;
pub mod reemit;
pub mod sse;

pub use aggregate::{aggregate_body, Aggregation, AggregationSource};
pub use extract::extract_event;
pub use reemit::{reemit_stream, StreamReemitter};
pub use sse::DataLineParser;

use crate::protocol::backend::BackendEvent;

/// Text and terminal state collected for one response.
#[derive(Debug, Default)]
pub struct Accumulator {
    text: String,
    finish_reason: Option<String>,
    fragments: usize,
}

impl Accumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the event's fragment and remember its terminal reason, if any.
    pub fn push(&mut self, event: &BackendEvent) {
        if let Some(text) = event.text.as_deref() {
            self.text.push_str(text);
            self.fragments += 1;
        }
        if let Some(reason) = event.finish_reason.as_deref() {
            self.finish_reason = Some(reason.to_string());
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    #[must_use]
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn into_parts(self) -> (String, Option<String>, usize) {
        (self.text, self.finish_reason, self.fragments)
    }
}
