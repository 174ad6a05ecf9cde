//! SSE `data:` line parsing for backend bodies and frame helpers for the
//! outbound stream.

use memchr::memchr_iter;

pub const DONE_SENTINEL: &str = "[DONE]";
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Incremental backend line parser.
///
/// Bytes may arrive split at arbitrary boundaries. Lines end at `\n` (a
/// trailing `\r` is dropped); a blank line closes the current group and
/// releases its `data:` payloads. Non-`data:` lines are ignored.
#[derive(Debug, Default)]
pub struct DataLineParser {
    buffer: Vec<u8>,
    read_offset: usize,
    group: Vec<String>,
}

impl DataLineParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and append the payloads of every completed group.
    pub fn feed_into(&mut self, chunk: &[u8], out: &mut Vec<String>) {
        self.buffer.extend_from_slice(chunk);
        let mut processed_up_to = self.read_offset;
        let scan_start = processed_up_to;
        for rel_pos in memchr_iter(b'\n', &self.buffer[scan_start..]) {
            let line_end = scan_start + rel_pos;
            let line = &self.buffer[processed_up_to..line_end];
            Self::process_line(line, &mut self.group, out);
            processed_up_to = line_end + 1;
        }

        self.read_offset = processed_up_to;
        if self.read_offset == self.buffer.len() {
            self.buffer.clear();
            self.read_offset = 0;
            return;
        }
        let should_compact = self.read_offset > 0
            && (self.read_offset >= self.buffer.len() / 2 || self.read_offset >= 8 * 1024);
        if should_compact {
            self.buffer.drain(..self.read_offset);
            self.read_offset = 0;
        }
    }

    /// Flush at end of input: an unterminated last line and an open group
    /// are released as if the stream had ended with a blank line.
    pub fn finish_into(&mut self, out: &mut Vec<String>) {
        if self.read_offset < self.buffer.len() {
            let line = &self.buffer[self.read_offset..];
            Self::process_line(line, &mut self.group, out);
        }
        self.buffer.clear();
        self.read_offset = 0;
        out.append(&mut self.group);
    }

    fn process_line(line: &[u8], group: &mut Vec<String>, out: &mut Vec<String>) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.trim_ascii().is_empty() {
            out.append(group);
            return;
        }
        let Some(value) = line.strip_prefix(b"data:") else {
            return;
        };
        // a line never splits a multi-byte sequence, so lossy decoding only
        // touches bytes that were invalid to begin with
        let payload = String::from_utf8_lossy(value);
        let payload = payload.trim();
        if !payload.is_empty() {
            group.push(payload.to_string());
        }
    }
}

/// Format an OpenAI-style SSE frame (no event type, just data).
#[must_use]
pub fn openai_sse_frame(json: &str) -> String {
    let mut out = String::with_capacity(10 + json.len());
    out.push_str("data: ");
    out.push_str(json);
    out.push_str("\n\n");
    out
}

#[must_use]
pub fn done_frame() -> bytes::Bytes {
    bytes::Bytes::from_static(DONE_FRAME.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut DataLineParser, chunks: &[&[u8]]) -> Vec<String> {
        let mut out = Vec::new();
        for chunk in chunks {
            parser.feed_into(chunk, &mut out);
        }
        out
    }

    #[test]
    fn test_group_released_on_blank_line() {
        let mut parser = DataLineParser::new();
        let out = feed_all(&mut parser, &[b"data: {\"text\":\"a\"}\n"]);
        assert!(out.is_empty());
        let out = feed_all(&mut parser, &[b"\n"]);
        assert_eq!(out, vec!["{\"text\":\"a\"}"]);
    }

    #[test]
    fn test_split_across_chunk_boundaries() {
        let mut parser = DataLineParser::new();
        let out = feed_all(
            &mut parser,
            &[b"da", b"ta: {\"te", b"xt\":\"x\"}\r", b"\n\r\n", b"data: [DONE]\n\n"],
        );
        assert_eq!(out, vec!["{\"text\":\"x\"}", "[DONE]"]);
    }

    #[test]
    fn test_multiple_data_lines_in_one_group_stay_separate() {
        let mut parser = DataLineParser::new();
        let out = feed_all(&mut parser, &[b"data: one\ndata:two\n\n"]);
        assert_eq!(out, vec!["one", "two"]);
    }

    #[test]
    fn test_ignores_other_fields_and_empty_data() {
        let mut parser = DataLineParser::new();
        let out = feed_all(
            &mut parser,
            &[b": comment\nevent: message\nid: 7\ndata:   \ndata: kept\n\n"],
        );
        assert_eq!(out, vec!["kept"]);
    }

    #[test]
    fn test_whitespace_only_line_is_blank() {
        let mut parser = DataLineParser::new();
        let out = feed_all(&mut parser, &[b"data: a\n  \t\n"]);
        assert_eq!(out, vec!["a"]);
    }

    #[test]
    fn test_finish_releases_unterminated_tail() {
        let mut parser = DataLineParser::new();
        let mut out = feed_all(&mut parser, &[b"data: first\n\ndata: second\ndata: tail"]);
        assert_eq!(out, vec!["first"]);
        parser.finish_into(&mut out);
        assert_eq!(out, vec!["first", "second", "tail"]);
    }

    #[test]
    fn test_multibyte_text_split_mid_character() {
        let line = "data: {\"text\":\"héllo ✓\"}\n\n".as_bytes();
        let (head, tail) = line.split_at(17);
        let mut parser = DataLineParser::new();
        let out = feed_all(&mut parser, &[head, tail]);
        assert_eq!(out, vec!["{\"text\":\"héllo ✓\"}"]);
    }

    #[test]
    fn test_frame_helpers() {
        assert_eq!(openai_sse_frame("{}"), "data: {}\n\n");
        assert_eq!(&done_frame()[..], b"data: [DONE]\n\n");
    }
}
