//! Resumable line scanning.
//!
//! Lines end at `\n`, optionally preceded by `\r`. The reader remembers how far
//! it has already looked, so bytes of a partial line are scanned only once no
//! matter how many reads it takes for the terminator to arrive.

use bytes::{Bytes, BytesMut};

use crate::ensure;
use crate::protocol::ParseError;

#[derive(Debug, Default)]
pub(crate) struct LineReader {
    scanned: usize,
}

impl LineReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Splits the next complete line off `src`, terminator included.
    ///
    /// Returns `Ok(None)` when no terminator is buffered yet. Fails as soon as
    /// the line content grows past `max_size`, whether or not the terminator
    /// has arrived.
    pub(crate) fn read_line(
        &mut self,
        src: &mut BytesMut,
        max_size: usize,
        in_start_line: bool,
    ) -> Result<Option<Bytes>, ParseError> {
        match src[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let lf = self.scanned + offset;
                self.scanned = 0;

                let content_len = content_len(&src[..lf]);
                ensure!(content_len <= max_size, ParseError::line_too_large(content_len, max_size, in_start_line));

                Ok(Some(src.split_to(lf + 1).freeze()))
            }
            None => {
                self.scanned = src.len();

                // a trailing CR may be the first half of the terminator
                let content_len = content_len(src);
                ensure!(content_len <= max_size, ParseError::line_too_large(content_len, max_size, in_start_line));

                Ok(None)
            }
        }
    }

    /// Forgets any partial scan, for when the owner discards its buffer.
    pub(crate) fn reset(&mut self) {
        self.scanned = 0;
    }
}

#[inline]
fn content_len(bytes: &[u8]) -> usize {
    match bytes.last() {
        Some(b'\r') => bytes.len() - 1,
        _ => bytes.len(),
    }
}

/// Strips the `\n` or `\r\n` terminator from a line returned by
/// [`LineReader::read_line`].
pub(crate) fn trim_line_end(mut line: Bytes) -> Bytes {
    if line.last() == Some(&b'\n') {
        line.truncate(line.len() - 1);
    }
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line
}
