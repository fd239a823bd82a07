//! HTTP response message.
//!
//! Handlers build a [`Response`] and hand it to their responder; the client
//! side gets one back from the response decoder.

use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{HeaderName, HeaderValue, StatusCode, Version};

use crate::protocol::request::{parse_version, split_tokens};
use crate::protocol::{Headers, ProtocolError};

/// The `VERSION SP STATUS SP REASON` line of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    version: Version,
    status: StatusCode,
    reason: Option<String>,
}

impl StatusLine {
    pub fn new(version: Version, status: StatusCode) -> Self {
        Self { version, status, reason: None }
    }

    /// Parses a status line with its terminator already stripped. The reason
    /// phrase is optional and may contain spaces.
    pub fn parse(line: Bytes) -> Result<Self, ProtocolError> {
        let mut tokens = split_tokens(&line);
        let (Some(version), Some(status)) = (tokens.next(), tokens.next()) else {
            return Err(ProtocolError::invalid_start_line(String::from_utf8_lossy(&line)));
        };

        let version = parse_version(&line[version])?;

        let reason = String::from_utf8_lossy(line[status.end..].trim_ascii()).into_owned();

        let status_bytes = &line[status];
        let status = Some(status_bytes)
            .filter(|s| s.len() == 3)
            .and_then(|s| StatusCode::from_bytes(s).ok())
            .ok_or_else(|| ProtocolError::InvalidStatus { status: String::from_utf8_lossy(status_bytes).into_owned() })?;

        Ok(Self { version, status, reason: Some(reason) })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase as received, or the canonical one for the status.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.status.canonical_reason().unwrap_or(""),
        }
    }
}

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    line: StatusLine,
    headers: Headers,
    body: Bytes,
    chunked: bool,
    trailers: Headers,
}

impl Response {
    /// Creates an HTTP/1.1 response with no headers and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            line: StatusLine::new(Version::HTTP_11, status),
            headers: Headers::new(),
            body: Bytes::new(),
            chunked: false,
            trailers: Headers::new(),
        }
    }

    /// Creates a `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::with_body(StatusCode::OK, body)
    }

    pub fn with_body(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut response = Self::new(status);
        response.set_body(body);
        response
    }

    pub(crate) fn from_parts(line: StatusLine, headers: Headers, body: Bytes, chunked: bool, trailers: Headers) -> Self {
        Self { line, headers, body, chunked, trailers }
    }

    pub fn status_line(&self) -> &StatusLine {
        &self.line
    }

    pub fn status(&self) -> StatusCode {
        self.line.status()
    }

    pub fn reason(&self) -> &str {
        self.line.reason()
    }

    pub fn version(&self) -> Version {
        self.line.version()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The parsed `Content-Length` of a response without body bytes, such as
    /// one answering HEAD or a 304. Otherwise the length of the body; for a
    /// decoded chunked response, the sum of all chunk sizes.
    pub fn content_length(&self) -> u64 {
        let declared = (self.body.is_empty() && !self.chunked)
            .then(|| self.headers.get_str(CONTENT_LENGTH))
            .flatten()
            .and_then(|value| value.trim().parse().ok());
        declared.unwrap_or(self.body.len() as u64)
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.line.status = status;
        self.line.reason = None;
    }

    /// Overrides the reason phrase sent on the status line.
    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.line.reason = Some(reason.into());
    }

    pub fn set_version(&mut self, version: Version) {
        self.line.version = version;
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Sends the body with `Transfer-Encoding: chunked` instead of a
    /// `Content-Length`.
    pub fn set_chunked(&mut self, chunked: bool) {
        self.chunked = chunked;
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_line() {
        let line = StatusLine::parse(Bytes::from_static(b"HTTP/1.1 404 Not Found")).unwrap();
        assert_eq!(line.version(), Version::HTTP_11);
        assert_eq!(line.status(), StatusCode::NOT_FOUND);
        assert_eq!(line.reason(), "Not Found");
    }

    #[test]
    fn parse_status_line_without_reason() {
        let line = StatusLine::parse(Bytes::from_static(b"HTTP/1.0 200")).unwrap();
        assert_eq!(line.version(), Version::HTTP_10);
        assert_eq!(line.status(), StatusCode::OK);
        assert_eq!(line.reason(), "");
    }

    #[test]
    fn parse_custom_reason() {
        let line = StatusLine::parse(Bytes::from_static(b"HTTP/1.1 200 Totally  Fine ")).unwrap();
        assert_eq!(line.reason(), "Totally  Fine");
    }

    #[test]
    fn reject_bad_status_lines() {
        assert!(matches!(StatusLine::parse(Bytes::from_static(b"HTTP/1.1")), Err(ProtocolError::InvalidStartLine { .. })));
        assert!(matches!(StatusLine::parse(Bytes::from_static(b"HTTP/1.1 2000 OK")), Err(ProtocolError::InvalidStatus { .. })));
        assert!(matches!(StatusLine::parse(Bytes::from_static(b"HTTP/1.1 abc OK")), Err(ProtocolError::InvalidStatus { .. })));
        assert!(matches!(StatusLine::parse(Bytes::from_static(b"ICY 200 OK")), Err(ProtocolError::InvalidVersion { .. })));
    }

    #[test]
    fn default_reason_follows_status() {
        let mut response = Response::ok("hello");
        assert_eq!(response.reason(), "OK");
        assert_eq!(response.content_length(), 5);

        response.set_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.reason(), "Service Unavailable");

        response.set_reason("Come Back Later");
        assert_eq!(response.reason(), "Come Back Later");
    }
}
