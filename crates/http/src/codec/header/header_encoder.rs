//! Header block serialization shared by the request and response encoders.
//!
//! The framing headers are always derived from the message body, so any
//! `Content-Length` or `Transfer-Encoding` set by the caller is replaced
//! rather than trusted.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};

use crate::protocol::Headers;

/// Initial buffer size reserved for a message head.
pub(crate) const INIT_HEADER_SIZE: usize = 4 * 1024;

/// How the body following a header block is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    /// Exact `Content-Length`.
    Length(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// Neither header is written, e.g. for `204 No Content`.
    Bodiless,
    /// The caller's framing headers are written untouched.
    Preserve,
}

/// Writes every header followed by the framing header and the empty line that
/// ends the block.
pub(crate) fn encode_headers(headers: &Headers, framing: Framing, dst: &mut BytesMut) -> io::Result<()> {
    for (name, value) in headers {
        if framing != Framing::Preserve && (*name == CONTENT_LENGTH || *name == TRANSFER_ENCODING) {
            continue;
        }
        dst.put_slice(name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(value.as_ref());
        dst.put_slice(b"\r\n");
    }

    match framing {
        Framing::Length(length) => write!(FastWrite(dst), "content-length: {length}\r\n")?,
        Framing::Chunked => dst.put_slice(b"transfer-encoding: chunked\r\n"),
        Framing::Bodiless | Framing::Preserve => {}
    }

    dst.put_slice(b"\r\n");
    Ok(())
}

/// Fast writer implementation for writing to BytesMut.
///
/// Lets `write!` format straight into the buffer without an intermediate
/// `String`.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
