//! Pieces of the chunked transfer coding that the message decoder drives.
//!
//! See [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//! The message decoder owns the state; this module only knows how to read a
//! chunk-size line and the CRLF that closes each chunk's data.

use bytes::{Buf, Bytes, BytesMut};
use httparse::Status;

use crate::protocol::ProtocolError;

/// Parses a chunk-size line, terminator included, ignoring any extensions.
pub(crate) fn parse_chunk_size(line: &Bytes) -> Result<u64, ProtocolError> {
    // httparse treats an empty size as zero, the grammar requires a digit
    if !line.first().is_some_and(u8::is_ascii_hexdigit) {
        return Err(ProtocolError::InvalidChunkSize);
    }

    let status = if line.ends_with(b"\r\n") {
        httparse::parse_chunk_size(line)
    } else {
        // bare LF terminator
        let mut crlf = Vec::with_capacity(line.len() + 1);
        crlf.extend_from_slice(&line[..line.len() - 1]);
        crlf.extend_from_slice(b"\r\n");
        httparse::parse_chunk_size(&crlf)
    };

    match status {
        Ok(Status::Complete((_, size))) => Ok(size),
        Ok(Status::Partial) | Err(_) => Err(ProtocolError::InvalidChunkSize),
    }
}

/// Consumes the line break that follows chunk data.
///
/// Returns `Ok(false)` when not enough bytes are buffered to tell.
pub(crate) fn read_chunk_delimiter(src: &mut BytesMut) -> Result<bool, ProtocolError> {
    match src.first() {
        None => Ok(false),
        Some(b'\n') => {
            src.advance(1);
            Ok(true)
        }
        Some(b'\r') => match src.get(1) {
            None => Ok(false),
            Some(b'\n') => {
                src.advance(2);
                Ok(true)
            }
            Some(_) => Err(ProtocolError::InvalidChunkDelimiter),
        },
        Some(_) => Err(ProtocolError::InvalidChunkDelimiter),
    }
}
