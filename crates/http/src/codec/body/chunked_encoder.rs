use std::io;
use std::io::Write;

use bytes::BytesMut;

use crate::codec::header::FastWrite;

/// Writes `data` as one chunk followed by the last chunk, with no trailers.
///
/// An empty body produces only the last chunk.
pub(crate) fn encode_chunked_body(data: &[u8], dst: &mut BytesMut) -> io::Result<()> {
    if !data.is_empty() {
        write!(FastWrite(dst), "{:X}\r\n", data.len())?;
        dst.reserve(data.len() + 2);
        dst.extend_from_slice(data);
        dst.extend_from_slice(b"\r\n");
    }
    dst.extend_from_slice(b"0\r\n\r\n");
    Ok(())
}
