//! Incremental decoder for `text/event-stream` bodies.
//!
//! Only the `data` field matters for status snapshots; `event`, `id` and
//! `retry` fields are accepted and ignored, as are `:` comment lines.

use bytes::{Buf, BytesMut};

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the data payload of every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.split_to(line_end);
            self.buffer.advance(1);
            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            if let Some(event) = self.consume_line(&String::from_utf8_lossy(line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes an event left unterminated when the stream ends.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = String::from_utf8_lossy(&rest).trim_end_matches('\r').to_string();
            let _ = self.consume_line(&rest);
        }
        self.dispatch()
    }

    fn consume_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data).join("\n"))
    }
}
