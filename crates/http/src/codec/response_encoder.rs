//! HTTP response encoder.
//!
//! Writes the status line, the headers in their stored order and the body.
//! Framing headers are derived from the body:
//!
//! - chunked responses get `Transfer-Encoding: chunked` and the body as a
//!   single chunk followed by the last chunk
//! - other responses get an exact `Content-Length`
//! - 1xx, 204 and 304 responses get neither, and no body

use std::io::Write;

use bytes::BytesMut;
use http::header::CONTENT_LENGTH;
use http::{StatusCode, Version};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::body::encode_chunked_body;
use crate::codec::header::{FastWrite, Framing, INIT_HEADER_SIZE, encode_headers};
use crate::protocol::{Response, SendError};

#[derive(Debug, Default)]
pub struct ResponseEncoder {
    omit_body: bool,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes only the head of the following responses, as when answering
    /// HEAD requests. Framing headers still describe the body.
    pub fn omit_body(&mut self, omit_body: bool) {
        self.omit_body = omit_body;
    }
}

pub(crate) fn is_bodiless_status(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

pub(crate) fn version_str(version: Version) -> Option<&'static str> {
    match version {
        Version::HTTP_11 => Some("HTTP/1.1"),
        Version::HTTP_10 => Some("HTTP/1.0"),
        _ => None,
    }
}

impl Encoder<Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let Some(version) = version_str(item.version()) else {
            error!(http_version = ?item.version(), "unsupported http version");
            return Err(SendError::invalid_response(format!("unsupported http version {:?}", item.version())));
        };

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "{version} {} {}\r\n", item.status().as_str(), item.reason())?;

        let bodiless = is_bodiless_status(item.status());
        let framing = if bodiless {
            Framing::Bodiless
        } else if self.omit_body && item.body().is_empty() && item.headers().contains(CONTENT_LENGTH) {
            // a HEAD handler may state the length it would have sent
            Framing::Preserve
        } else if item.is_chunked() {
            Framing::Chunked
        } else {
            Framing::Length(item.body().len() as u64)
        };
        encode_headers(item.headers(), framing, dst)?;

        if bodiless || self.omit_body {
            return Ok(());
        }

        if item.is_chunked() {
            encode_chunked_body(item.body(), dst)?;
        } else {
            dst.extend_from_slice(item.body());
        }
        Ok(())
    }
}
