use std::time::Instant;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use smallvec::SmallVec;
use tracing::warn;

use crate::observability::log_request_complete;
use crate::protocol::openai_chat::response_encoder::{build_chunk, encode_chunk_frame};
use crate::util::unix_now_secs;

use super::extract::extract_event;
use super::sse::done_frame;
use super::{Accumulator, DataLineParser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReemitState {
    ReadingLine,
    Closed,
}

/// Turns backend SSE bytes into outbound `chat.completion.chunk` frames.
///
/// Every frame carries the same response id. `[DONE]` is written exactly
/// once, by [`StreamReemitter::finish_into`]; after that the machine is
/// closed and ignores further input.
pub struct StreamReemitter {
    parser: DataLineParser,
    payloads: Vec<String>,
    response_id: String,
    model: String,
    state: ReemitState,
    accumulator: Accumulator,
    started: Instant,
}

impl StreamReemitter {
    #[must_use]
    pub fn new(response_id: String, model: String) -> Self {
        Self {
            parser: DataLineParser::new(),
            payloads: Vec::with_capacity(4),
            response_id,
            model,
            state: ReemitState::ReadingLine,
            accumulator: Accumulator::new(),
            started: Instant::now(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ReemitState {
        self.state
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == ReemitState::Closed
    }

    #[must_use]
    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    /// Feed backend bytes, appending one frame per event that carries a
    /// fragment or a terminal reason.
    pub fn feed_into(&mut self, chunk: &[u8], out: &mut Vec<Bytes>) {
        if self.is_closed() {
            return;
        }
        self.parser.feed_into(chunk, &mut self.payloads);
        self.dispatch_pending(out);
    }

    /// End of input: dispatch whatever is still buffered, then `[DONE]`.
    pub fn finish_into(&mut self, out: &mut Vec<Bytes>) {
        if self.is_closed() {
            return;
        }
        self.parser.finish_into(&mut self.payloads);
        self.dispatch_pending(out);
        out.push(done_frame());
        self.state = ReemitState::Closed;

        log_request_complete(
            &self.model,
            true,
            self.accumulator.fragments(),
            self.accumulator.text(),
            self.started.elapsed(),
        );
    }

    fn dispatch_pending(&mut self, out: &mut Vec<Bytes>) {
        let mut payloads = std::mem::take(&mut self.payloads);
        for payload in payloads.drain(..) {
            let event = extract_event(&payload);
            if event.is_empty() {
                continue;
            }
            self.accumulator.push(&event);
            let chunk = build_chunk(&self.response_id, unix_now_secs(), &self.model, &event);
            match encode_chunk_frame(&chunk) {
                Ok(frame) => out.push(frame),
                Err(e) => warn!(error = %e, "dropping chunk that failed to serialize"),
            }
        }
        self.payloads = payloads;
    }
}

struct PendingBytes {
    chunks: SmallVec<[Bytes; 8]>,
    head: usize,
}

impl PendingBytes {
    #[inline]
    fn with_capacity(capacity: usize) -> Self {
        let mut chunks = SmallVec::new();
        chunks.reserve(capacity);
        Self { chunks, head: 0 }
    }

    #[inline]
    fn pop_front(&mut self) -> Option<Bytes> {
        if self.head >= self.chunks.len() {
            return None;
        }
        let chunk = std::mem::take(&mut self.chunks[self.head]);
        self.head += 1;
        if self.head == self.chunks.len() {
            self.chunks.clear();
            self.head = 0;
        }
        Some(chunk)
    }

    #[inline]
    fn extend_from_vec(&mut self, frames: &mut Vec<Bytes>) {
        if frames.is_empty() {
            return;
        }
        self.chunks.reserve(frames.len());
        self.chunks.extend(frames.drain(..));
    }
}

/// Drive a [`StreamReemitter`] over a backend body, yielding one `Bytes` per
/// outbound frame.
///
/// A read error ends the stream like a clean EOF: it is logged and `[DONE]`
/// still follows. Dropping the returned stream drops the backend body.
pub fn reemit_stream<S, E>(byte_stream: S, reemitter: StreamReemitter) -> impl Stream<Item = Bytes> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    futures_util::stream::unfold(
        (
            Box::pin(byte_stream),
            reemitter,
            PendingBytes::with_capacity(8),
            Vec::<Bytes>::with_capacity(8),
        ),
        |(mut stream, mut reemitter, mut pending, mut produced)| async move {
            loop {
                if let Some(frame) = pending.pop_front() {
                    return Some((frame, (stream, reemitter, pending, produced)));
                }
                if reemitter.is_closed() {
                    return None;
                }

                match stream.as_mut().next().await {
                    Some(Ok(bytes)) => reemitter.feed_into(&bytes, &mut produced),
                    Some(Err(e)) => {
                        warn!(
                            error = %e,
                            response_id = reemitter.response_id(),
                            "backend stream read failed, closing client stream"
                        );
                        reemitter.finish_into(&mut produced);
                    }
                    None => reemitter.finish_into(&mut produced),
                }
                pending.extend_from_vec(&mut produced);
            }
        },
    )
}
