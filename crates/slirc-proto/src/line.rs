//! CR LF line framing for tokio.
//!
//! [`LineCodec`] splits a byte stream into complete lines, each still
//! carrying its `\r\n` terminator so the grammar sees exactly what arrived.
//! Lines longer than the configured limit are skipped rather than treated as
//! stream errors: the codec reports a [`Line::Discarded`] and resumes at the
//! next terminator.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const CRLF: &[u8] = b"\r\n";

/// Default line limit in bytes, terminator included (RFC 1459).
pub const MAX_LINE_LEN: usize = 512;

/// One framed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A complete line, terminator included.
    Complete(BytesMut),
    /// An overlong or unterminated line that was dropped.
    Discarded {
        /// Bytes dropped, terminator included when one was seen.
        length: usize,
    },
}

/// Codec that splits input on `\r\n`.
///
/// By default, lines are limited to 512 bytes (IRC standard).
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index of next byte to check for a terminator
    next_index: usize,
    /// Maximum line length, terminator included
    max_len: usize,
    /// Bytes dropped so far from an overlong line, if one is being skipped
    discarding: Option<usize>,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a codec with the default 512-byte limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len: max_len.max(CRLF.len()),
            discarding: None,
        }
    }

    /// The configured line limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Frame outgoing data as exactly one line.
    ///
    /// Everything from the first line break on is dropped, then `\r\n` is
    /// appended. Returns `None` when nothing is left to send.
    pub fn frame(data: &[u8]) -> Option<BytesMut> {
        let end = data
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(data.len());
        if end == 0 {
            return None;
        }

        let mut line = BytesMut::with_capacity(end + CRLF.len());
        line.put_slice(&data[..end]);
        line.put_slice(CRLF);
        Some(line)
    }

    fn find_terminator(&self, src: &BytesMut) -> Option<usize> {
        // A CR may have been the last byte of the previous read.
        let start = self.next_index.saturating_sub(1);
        src[start..]
            .windows(CRLF.len())
            .position(|w| w == CRLF)
            .map(|offset| start + offset)
    }
}

impl Decoder for LineCodec {
    type Item = Line;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Line>> {
        match self.find_terminator(src) {
            Some(pos) => {
                let line = src.split_to(pos + CRLF.len());
                self.next_index = 0;

                if let Some(dropped) = self.discarding.take() {
                    let length = dropped + line.len();
                    tracing::debug!(length, "skipped overlong line");
                    return Ok(Some(Line::Discarded { length }));
                }

                if line.len() > self.max_len {
                    tracing::debug!(length = line.len(), limit = self.max_len, "dropping overlong line");
                    return Ok(Some(Line::Discarded { length: line.len() }));
                }

                Ok(Some(Line::Complete(line)))
            }
            None => {
                let over_limit = self.discarding.is_some() || src.len() > self.max_len;
                if over_limit && !src.is_empty() {
                    // Keep a trailing CR: it may pair with the next LF.
                    let keep = usize::from(src.last() == Some(&b'\r'));
                    let drop = src.len() - keep;
                    src.advance(drop);
                    *self.discarding.get_or_insert(0) += drop;
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Line>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }

        let leftover = src.len() + self.discarding.take().unwrap_or(0);
        src.clear();
        self.next_index = 0;
        if leftover == 0 {
            Ok(None)
        } else {
            tracing::debug!(length = leftover, "dropping unterminated line at end of stream");
            Ok(Some(Line::Discarded { length: leftover }))
        }
    }
}

impl Encoder<&[u8]> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, data: &[u8], dst: &mut BytesMut) -> io::Result<()> {
        if let Some(line) = Self::frame(data) {
            dst.extend_from_slice(&line);
        }
        Ok(())
    }
}
