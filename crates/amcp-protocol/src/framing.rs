//! Delimiter-terminated response framing.
//!
//! AMCP responses are sequences of `\r\n` lines. A frame is everything up
//! to and including a delimiter (`\r\n` for a status or single data line,
//! `\r\n\r\n` for a block). [`FrameBuffer`] accumulates raw bytes as they
//! arrive and cuts frames out of them; it does no I/O itself.
//!
//! The delimiter of the previous frame still counts toward the next search.
//! After the status line `200 TLS OK\r\n`, a lone `\r\n` completes the
//! `\r\n\r\n` of an empty block:
//!
//! ```text
//! 200 TLS OK\r\n\r\n
//!           ^^^^      status line frame
//!             ^^^^    empty block frame
//! ```
//!
//! The flip side is that a `200` payload must not start with a blank line:
//! `200 OK\r\n\r\nline\r\n\r\n` ends the block at the first blank line and
//! leaves `line` buffered.

use serde::Serialize;
use tracing::trace;

use crate::error::{AmcpError, AmcpResult};
use crate::status::StatusLine;

/// Default upper bound on a single frame.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Accumulates stream bytes and splits them into delimiter-terminated frames.
///
/// A block read right after a status line treats a leading blank line as
/// the end of the block, so block payloads must not begin with one.
#[derive(Debug)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    /// Trailing bytes of the last frame's delimiter.
    carry: Vec<u8>,
    /// Bytes of `buf` already searched for the current delimiter.
    scanned: usize,
    max_frame_bytes: usize,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameBuffer {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            carry: Vec::new(),
            scanned: 0,
            max_frame_bytes,
        }
    }

    /// Appends bytes read from the stream.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes buffered that do not belong to a returned frame yet.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Cuts the next frame ending in `delimiter` out of the buffer.
    ///
    /// Returns the frame's non-empty lines, or `None` if more bytes are
    /// needed. Bytes after the delimiter stay buffered for the next call.
    ///
    /// # Errors
    ///
    /// Returns `MalformedFrame` if the buffered bytes exceed the maximum
    /// frame size without a delimiter, or if the frame is not UTF-8.
    pub fn next_frame(&mut self, delimiter: &[u8]) -> AmcpResult<Option<Vec<String>>> {
        if delimiter.is_empty() {
            return Err(AmcpError::invalid_argument("empty frame delimiter"));
        }

        let Some(end) = self.find(delimiter) else {
            if self.buf.len() > self.max_frame_bytes {
                return Err(AmcpError::malformed(format!(
                    "frame exceeds {} bytes without a delimiter",
                    self.max_frame_bytes
                )));
            }
            self.scanned = self.buf.len();
            return Ok(None);
        };

        let frame: Vec<u8> = self.buf.drain(..end).collect();
        self.scanned = 0;
        // Carry plus frame always ends in the delimiter.
        self.carry = delimiter.to_vec();

        let lines = split_lines(&frame)?;
        trace!(bytes = frame.len(), lines = lines.len(), "frame complete");
        Ok(Some(lines))
    }

    /// Returns the end offset in `buf` of the first delimiter match that
    /// includes at least one new byte.
    fn find(&self, delimiter: &[u8]) -> Option<usize> {
        let carried = self.carry.len().min(delimiter.len() - 1);
        let tail = &self.carry[self.carry.len() - carried..];

        // Search window: carried tail followed by the buffer, resuming a
        // little before where the last unsuccessful scan stopped.
        let resume = self.scanned.saturating_sub(delimiter.len() - 1);
        let window: Vec<u8> = if resume == 0 {
            tail.iter().chain(self.buf.iter()).copied().collect()
        } else {
            self.buf[resume..].to_vec()
        };
        let offset = if resume == 0 { carried } else { 0 };

        window
            .windows(delimiter.len())
            .position(|w| w == delimiter)
            .map(|start| start + delimiter.len() - offset + resume)
    }

}

/// Splits a frame on line breaks, dropping empty lines.
fn split_lines(frame: &[u8]) -> AmcpResult<Vec<String>> {
    let text = std::str::from_utf8(frame)
        .map_err(|e| AmcpError::malformed(format!("response is not valid UTF-8: {e}")))?;

    Ok(text
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Everything received for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope {
    pub status: StatusLine,
    /// Payload lines, without terminators. Empty lines are not included.
    pub lines: Vec<String>,
}

impl ResponseEnvelope {
    pub fn new(status: StatusLine, lines: Vec<String>) -> Self {
        Self { status, lines }
    }

    pub fn code(&self) -> &str {
        self.status.code()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The first payload line, for single-line responses.
    pub fn first_line(&self) -> Option<&str> {
        self.lines.first().map(String::as_str)
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
