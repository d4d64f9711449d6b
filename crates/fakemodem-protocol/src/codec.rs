//! Line framer for incoming command bytes.
//!
//! Commands arrive one byte at a time over a character transport. Either a
//! carriage return or a line feed ends a command, so `\r`, `\n` and `\r\n`
//! are all accepted; the second half of a `\r\n` pair simply ends an empty
//! line, which is never reported.

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

/// Default maximum command line length in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// What the framer does with bytes that arrive after the line buffer is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Keep the most recent bytes, dropping the oldest ones.
    DiscardOldest,
    /// Drop the whole line and report it as [`Frame::Overflow`] at its terminator.
    #[default]
    Reject,
}

/// A unit of input produced by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete, trimmed, non-empty command line.
    Line(String),
    /// A line that exceeded the buffer limit under [`OverflowPolicy::Reject`].
    Overflow {
        /// The configured limit.
        max: usize,
        /// Number of bytes the line actually carried.
        actual: usize,
    },
}

/// Accumulates received bytes into command lines.
///
/// Bytes are decoded as UTF-8 when a line completes. Invalid sequences are
/// dropped rather than failing the stream; the number of dropped bytes is
/// tracked in [`LineFramer::discarded_bytes`].
#[derive(Debug)]
pub struct LineFramer {
    /// Bytes received since the last terminator.
    buffer: BytesMut,
    /// Maximum number of bytes kept for one line.
    max_line_length: usize,
    /// Overflow handling.
    policy: OverflowPolicy,
    /// Bytes of the current line that did not fit in the buffer.
    overflowed: usize,
    /// Total bytes dropped because they were not valid UTF-8.
    discarded_bytes: u64,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    /// Create a framer with the default limit and overflow policy.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_LINE_LENGTH, OverflowPolicy::default())
    }

    /// Create a framer with an explicit line limit and overflow policy.
    ///
    /// A limit of zero is raised to one byte.
    pub fn with_limit(max_line_length: usize, policy: OverflowPolicy) -> Self {
        let max_line_length = max_line_length.max(1);
        LineFramer {
            buffer: BytesMut::with_capacity(max_line_length.min(DEFAULT_MAX_LINE_LENGTH)),
            max_line_length,
            policy,
            overflowed: 0,
            discarded_bytes: 0,
        }
    }

    /// Feed one received byte.
    ///
    /// Returns a frame when the byte is a terminator that completes a
    /// non-empty line (or a rejected overflowing line).
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        if is_terminator(byte) {
            return self.finish_line();
        }

        if self.buffer.len() < self.max_line_length {
            self.buffer.extend_from_slice(&[byte]);
            return None;
        }

        self.overflowed += 1;
        if self.policy == OverflowPolicy::DiscardOldest {
            let _ = self.buffer.split_to(1);
            self.buffer.extend_from_slice(&[byte]);
        }
        None
    }

    /// Feed a chunk of received bytes, collecting every completed frame.
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        data.iter().filter_map(|&byte| self.feed(byte)).collect()
    }

    /// Encode a command for transmission, appending the `\r` terminator.
    pub fn encode_command(cmd: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(cmd.len() + 1);
        buf.extend_from_slice(cmd.as_bytes());
        buf.push(b'\r');
        buf
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes dropped as undecodable since the framer was created.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded_bytes
    }

    /// Get the configured line limit.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Clear the buffer and any pending overflow.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.overflowed = 0;
    }

    /// Get the current buffer contents as a string (for debugging).
    pub fn buffer_as_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).to_string()
    }

    fn finish_line(&mut self) -> Option<Frame> {
        let raw = self.buffer.split();
        let overflowed = std::mem::take(&mut self.overflowed);

        if overflowed > 0 && self.policy == OverflowPolicy::Reject {
            return Some(Frame::Overflow {
                max: self.max_line_length,
                actual: raw.len() + overflowed,
            });
        }

        let (text, dropped) = decode_tolerant(&raw);
        self.discarded_bytes += dropped as u64;

        let line = text.trim();
        if line.is_empty() {
            None
        } else {
            Some(Frame::Line(line.to_string()))
        }
    }
}

/// Check whether a byte ends a command line.
pub fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Decode bytes as UTF-8, dropping invalid sequences.
///
/// Returns the decoded text and the number of bytes that were dropped.
pub fn decode_tolerant(bytes: &[u8]) -> (String, usize) {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = 0;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped += chunk.invalid().len();
    }
    (text, dropped)
}
