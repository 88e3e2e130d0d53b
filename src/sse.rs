//! Server-Sent-Events framing.
//!
//! `Utf8Decoder` turns response body chunks into text without splitting a
//! multi-byte character, and `FrameDecoder` turns that text into blank-line
//! delimited frames. Neither flushes: a trailing frame without its
//! delimiter is dropped when the stream ends.

use crate::constants::protocol::{
    DATA_PREFIX, DEFAULT_EVENT_TYPE, EVENT_PREFIX, FRAME_DELIMITER,
};

/// One `event:`/`data:` block as it appeared on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame {
    pub event_type: String,
    /// Raw payload text, possibly empty
    pub data: String,
}

impl RawFrame {
    /// Parse a single trimmed, non-empty block.
    ///
    /// Later `event:`/`data:` lines override earlier ones; any other line
    /// (comments, `id:`, `retry:`) is ignored.
    pub fn parse(block: &str) -> Self {
        let mut event_type = DEFAULT_EVENT_TYPE.to_string();
        let mut data = String::new();

        for line in block.split('\n') {
            if let Some(rest) = line.strip_prefix(EVENT_PREFIX) {
                event_type = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
                data = rest.trim().to_string();
            }
        }

        Self { event_type, data }
    }
}

/// Splits an append-only text stream into frames
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and return every frame it completed, in order.
    pub fn feed(&mut self, chunk: &str) -> Vec<RawFrame> {
        self.buffer.push_str(chunk);
        if self.buffer.contains('\r') {
            // A "\r" at the end stays until its "\n" arrives.
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let Some(last) = self.buffer.rfind(FRAME_DELIMITER) else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last + FRAME_DELIMITER.len());
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(FRAME_DELIMITER)
            .map(str::trim)
            .filter(|block| !block.is_empty())
            .map(RawFrame::parse)
            .collect()
    }

    /// Bytes held back waiting for a delimiter
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Stream-aware UTF-8 decoding.
///
/// Incomplete sequences at the end of a chunk are carried into the next
/// call. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;

        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Truncated sequence: wait for the rest.
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// True when a partial character is waiting for more bytes
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
