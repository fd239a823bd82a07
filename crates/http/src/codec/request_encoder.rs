use std::io::Write;

use bytes::BytesMut;
use http::Method;
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::encode_chunked_body;
use crate::codec::header::{FastWrite, Framing, INIT_HEADER_SIZE, encode_headers};
use crate::codec::response_encoder::version_str;
use crate::protocol::{Request, SendError};

/// Encodes requests for sending to a server.
///
/// Bodies are framed with `Content-Length` unless the request is marked
/// chunked. Methods that usually carry a body get `Content-Length: 0` when
/// the body is empty.
#[derive(Debug, Default)]
pub struct RequestEncoder;

impl RequestEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Request> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let Some(version) = version_str(item.version()) else {
            error!(http_version = ?item.version(), "unsupported http version");
            return Err(SendError::invalid_request(format!("unsupported http version {:?}", item.version())));
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "{} {} {version}\r\n", item.method(), item.uri())?;

        let framing = if item.is_chunked() {
            Framing::Chunked
        } else if !item.body().is_empty() || [Method::POST, Method::PUT, Method::PATCH].contains(item.method()) {
            Framing::Length(item.body().len() as u64)
        } else {
            Framing::Bodiless
        };
        encode_headers(item.headers(), framing, dst)?;

        if item.is_chunked() {
            encode_chunked_body(item.body(), dst)?;
        } else {
            dst.extend_from_slice(item.body());
        }
        Ok(())
    }
}
