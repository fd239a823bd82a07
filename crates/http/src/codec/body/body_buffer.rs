//! Body accumulation for fixed-length bodies and chunk data.

use std::cmp;

use bytes::{Buf, Bytes, BytesMut};

/// Collects body bytes split off the read buffer until the message is
/// complete.
#[derive(Debug, Default)]
pub(crate) struct BodyBuffer {
    buf: BytesMut,
}

impl BodyBuffer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Moves up to `*remaining` bytes from `src` into the body and decrements
    /// `*remaining` accordingly.
    pub(crate) fn take(&mut self, src: &mut BytesMut, remaining: &mut u64) {
        // cap remaining bytes at the max capacity of usize
        let len = cmp::min(usize::try_from(*remaining).unwrap_or(usize::MAX), src.len());
        if len == 0 {
            return;
        }

        if self.buf.is_empty() {
            // no copy when the whole piece is already buffered
            self.buf = src.split_to(len);
        } else {
            self.buf.extend_from_slice(&src[..len]);
            src.advance(len);
        }
        *remaining -= len as u64;
    }

    /// Moves everything buffered in `src` into the body.
    pub(crate) fn take_all(&mut self, src: &mut BytesMut) {
        let mut remaining = src.len() as u64;
        self.take(src, &mut remaining);
    }

    pub(crate) fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Hands out the collected body and leaves the buffer empty.
    pub(crate) fn finish(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
    }
}
