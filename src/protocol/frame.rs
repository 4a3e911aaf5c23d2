//! Line framing for the wireless link.
//!
//! The wire format is just text plus a terminator: no header, length prefix
//! or checksum. Outbound frames are CRLF-terminated UTF-8 and may not exceed
//! [`MAX_FRAME_LEN`] bytes including the terminator.

// ============================================================================
// Imports
// ============================================================================

use tracing::{trace, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Maximum frame length in bytes, terminator included.
pub const MAX_FRAME_LEN: usize = 64;

/// Line terminator appended to outbound frames.
pub const TERMINATOR: &str = "\r\n";

/// Sigil prefixed to outbound command lines.
pub const OUTBOUND_SIGIL: char = '$';

/// Sigil prefixed to inbound response lines.
pub const INBOUND_SIGIL: char = '#';

// ============================================================================
// Encode / Decode
// ============================================================================

/// Encodes a line into frame bytes.
///
/// Appends CRLF unless the body already ends with it.
///
/// # Errors
///
/// [`Error::PayloadTooLong`] if the framed line exceeds [`MAX_FRAME_LEN`].
/// No bytes are produced in that case.
pub fn encode(body: &str) -> Result<Vec<u8>> {
    let mut line = String::with_capacity(body.len() + TERMINATOR.len());
    line.push_str(body);
    if !line.ends_with(TERMINATOR) {
        line.push_str(TERMINATOR);
    }

    let len = line.len();
    if len > MAX_FRAME_LEN {
        warn!(len, max = MAX_FRAME_LEN, "Rejected oversize frame");
        return Err(Error::payload_too_long(len, MAX_FRAME_LEN));
    }

    trace!(len, "Encoded frame");
    Ok(line.into_bytes())
}

/// Decodes frame bytes into a trimmed line.
///
/// Malformed UTF-8 is replaced rather than rejected, so no line is ever
/// dropped because of decoding.
#[must_use]
pub fn decode(buffer: &[u8]) -> String {
    String::from_utf8_lossy(buffer).trim().to_string()
}

// ============================================================================
// LineBuffer
// ============================================================================

/// Reassembles lines from notification chunks.
///
/// A notification may carry part of a line or several lines at once.
/// Bytes are held until a `\n` arrives; each complete line is returned
/// without its terminator.
///
/// At most [`MAX_FRAME_LEN`] unterminated bytes are held between pushes.
/// A partial line that outgrows that is dropped, along with the rest of
/// it up to the next `\n`.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Set while skipping the tail of an overlong line.
    discarding: bool,
}

impl LineBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every line it completes, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(line);
        }

        if self.pending.len() > MAX_FRAME_LEN {
            warn!(
                dropped = self.pending.len(),
                max = MAX_FRAME_LEN,
                "Dropped unterminated overlong line"
            );
            self.pending.clear();
            self.discarding = true;
        }

        lines
    }

    /// Returns and clears any unterminated bytes.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        self.discarding = false;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// Number of bytes waiting for a terminator.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
