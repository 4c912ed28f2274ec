//! Incremental server-sent events parser
//!
//! Bytes arrive in arbitrary chunks; events come out whole:
//! - Lines end with `\n` (a trailing `\r` is dropped)
//! - `data:` lines of one event are joined with `\n`
//! - A blank line dispatches the pending event
//! - `event:`, `id:`, `retry:` and `:` comment lines are ignored
//! - Buffer: 1MB maximum for an unterminated line

use crate::errors::{BuddyError, Result};

/// Maximum bytes held for a single unfinished line (1MB)
pub const MAX_BUFFER_SIZE: usize = 1_048_576;

/// Incremental SSE `data` extractor
#[derive(Debug)]
pub struct SseParser {
    /// Bytes after the last newline seen
    buffer: Vec<u8>,

    /// `data:` lines of the event being assembled
    pending: Vec<String>,

    max_buffer_size: usize,
}

impl SseParser {
    pub fn new() -> Self {
        Self::with_capacity(MAX_BUFFER_SIZE)
    }

    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            pending: Vec::new(),
            max_buffer_size,
        }
    }

    /// Feed bytes, returning the data of every event completed by them
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = decode_line(&line[..line.len() - 1])?;
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > self.max_buffer_size {
            return Err(BuddyError::Stream(format!(
                "Buffer overflow: {} bytes without a line break exceeds maximum {}",
                self.buffer.len(),
                self.max_buffer_size
            )));
        }

        Ok(events)
    }

    /// Flush at end of input: an unterminated last line and any event
    /// missing its blank line are still delivered
    pub fn finish(&mut self) -> Result<Option<String>> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            let line = decode_line(&line)?;
            if let Some(event) = self.process_line(&line) {
                return Ok(Some(event));
            }
        }
        Ok(self.dispatch())
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }

        if let Some(data) = line.strip_prefix("data:") {
            let data = data.strip_prefix(' ').unwrap_or(data);
            self.pending.push(data.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let data = self.pending.join("\n");
        self.pending.clear();
        Some(data)
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending.clear();
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_line(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| BuddyError::Stream(format!("invalid UTF-8 in event stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    const OPENAI_STREAM: &str = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
        ": keep-alive\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\r\n\r\n",
        "data: [DONE]\n\n",
    );

    #[test]
    fn test_single_event() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(b"data: hello\n\n").unwrap();
        assert_eq!(events, vec!["hello"]);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_incremental_event() {
        let mut parser = SseParser::new();
        assert!(parser.add_bytes(b"data: {\"a\"").unwrap().is_empty());
        assert!(parser.add_bytes(b":1}\n").unwrap().is_empty());
        assert_eq!(parser.add_bytes(b"\n").unwrap(), vec!["{\"a\":1}"]);
    }

    #[test]
    fn test_full_stream_with_comments_and_crlf() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(OPENAI_STREAM.as_bytes()).unwrap();
        assert_eq!(events.len(), 4);
        assert!(events[1].contains("\"Hi\""));
        assert!(events[2].contains("\" there\""));
        assert_eq!(events[3], "[DONE]");
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut parser = SseParser::new();
        let events = parser.add_bytes(b"event: message\ndata: line one\ndata:line two\n\n").unwrap();
        assert_eq!(events, vec!["line one\nline two"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut parser = SseParser::new();
        assert!(parser.add_bytes(b"data: [DONE]").unwrap().is_empty());
        assert_eq!(parser.finish().unwrap(), Some("[DONE]".to_string()));
        assert_eq!(parser.finish().unwrap(), None);
    }

    #[test]
    fn test_buffer_overflow() {
        let mut parser = SseParser::with_capacity(100);
        let result = parser.add_bytes(&vec![b'a'; 150]);
        assert!(matches!(result, Err(BuddyError::Stream(_))));
    }

    #[test]
    fn test_long_terminated_lines_do_not_overflow() {
        let mut parser = SseParser::with_capacity(100);
        let mut data = b"data: ".to_vec();
        data.extend(vec![b'x'; 150]);
        data.extend_from_slice(b"\n\n");
        assert_eq!(parser.add_bytes(&data).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut parser = SseParser::new();
        assert!(parser.add_bytes(b"data: \xff\xfe\n").unwrap_err().is_stream());
    }

    #[test]
    fn test_clear() {
        let mut parser = SseParser::new();
        parser.add_bytes(b"data: partial").unwrap();
        assert!(!parser.is_empty());
        parser.clear();
        assert!(parser.is_empty());
        assert_eq!(parser.buffer_size(), 0);
    }

    #[quickcheck]
    fn prop_chunk_boundaries_do_not_matter(cuts: Vec<usize>) -> bool {
        let bytes = OPENAI_STREAM.as_bytes();

        let mut whole = SseParser::new();
        let expected = whole.add_bytes(bytes).unwrap();

        let mut points: Vec<usize> = cuts.into_iter().map(|c| c % (bytes.len() + 1)).collect();
        points.sort_unstable();
        points.dedup();

        let mut parser = SseParser::new();
        let mut events = Vec::new();
        let mut start = 0;
        for point in points.into_iter().chain(std::iter::once(bytes.len())) {
            events.extend(parser.add_bytes(&bytes[start..point]).unwrap());
            start = point;
        }

        events == expected
    }
}
