//! HTTP request message.
//!
//! A [`Request`] is built by the decoder while its bytes arrive and is handed
//! to the connection only once complete. From then on it is treated as an
//! immutable value owned by whoever handles it.

use bytes::Bytes;
use http::header::{CONNECTION, EXPECT, UPGRADE};
use http::{HeaderName, HeaderValue, Method, Uri, Version};

use crate::protocol::{Headers, ProtocolError};

/// The `METHOD SP URI SP VERSION` line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: Method,
    uri: Uri,
    version: Version,
}

impl RequestLine {
    pub fn new(method: Method, uri: Uri, version: Version) -> Self {
        Self { method, uri, version }
    }

    /// Parses a request line with its terminator already stripped.
    ///
    /// Tokens are separated by spaces or tabs. Methods outside the supported
    /// set and versions other than HTTP/1.0 and HTTP/1.1 are rejected.
    pub fn parse(line: Bytes) -> Result<Self, ProtocolError> {
        let mut tokens = split_tokens(&line);
        let (Some(method), Some(uri), Some(version), None) = (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ProtocolError::invalid_start_line(String::from_utf8_lossy(&line)));
        };

        let method = parse_method(&line[method.clone()])?;
        let version = parse_version(&line[version])?;
        let uri = Uri::from_maybe_shared(line.slice(uri.clone()))
            .map_err(|_| ProtocolError::InvalidUri { uri: String::from_utf8_lossy(&line[uri]).into_owned() })?;

        Ok(Self { method, uri, version })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

/// Yields the byte ranges of space or tab separated tokens.
pub(crate) fn split_tokens(line: &[u8]) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < line.len() && is_space(line[pos]) {
            pos += 1;
        }
        if pos == line.len() {
            return None;
        }
        let start = pos;
        while pos < line.len() && !is_space(line[pos]) {
            pos += 1;
        }
        Some(start..pos)
    })
}

#[inline]
fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Methods accepted by the decoder, WebDAV included.
const SUPPORTED_METHODS: &[&[u8]] = &[
    b"GET", b"HEAD", b"POST", b"PUT", b"DELETE", b"TRACE", b"OPTIONS", b"CONNECT", b"PATCH", b"PROPFIND", b"PROPPATCH",
    b"LOCK", b"UNLOCK", b"REPORT", b"ACL", b"MOVE", b"COPY", b"MKCOL",
];

fn parse_method(token: &[u8]) -> Result<Method, ProtocolError> {
    let invalid = || ProtocolError::InvalidMethod { method: String::from_utf8_lossy(token).into_owned() };
    if !SUPPORTED_METHODS.iter().any(|m| *m == token) {
        return Err(invalid());
    }
    Method::from_bytes(token).map_err(|_| invalid())
}

pub(crate) fn parse_version(token: &[u8]) -> Result<Version, ProtocolError> {
    match token {
        b"HTTP/1.1" => Ok(Version::HTTP_11),
        b"HTTP/1.0" => Ok(Version::HTTP_10),
        // HTTP/2 and HTTP/3 are not carried over HTTP/1 framing
        _ => Err(ProtocolError::InvalidVersion { version: String::from_utf8_lossy(token).into_owned() }),
    }
}

/// A complete HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    line: RequestLine,
    headers: Headers,
    body: Bytes,
    chunked: bool,
    trailers: Headers,
}

impl Request {
    /// Creates an HTTP/1.1 request with no headers and no body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self::from_line(RequestLine::new(method, uri, Version::HTTP_11))
    }

    pub fn get(uri: &'static str) -> Self {
        Self::new(Method::GET, Uri::from_static(uri))
    }

    pub fn post(uri: &'static str, body: impl Into<Bytes>) -> Self {
        let mut request = Self::new(Method::POST, Uri::from_static(uri));
        request.set_body(body);
        request
    }

    pub(crate) fn from_line(line: RequestLine) -> Self {
        Self { line, headers: Headers::new(), body: Bytes::new(), chunked: false, trailers: Headers::new() }
    }

    pub(crate) fn from_parts(line: RequestLine, headers: Headers, body: Bytes, chunked: bool, trailers: Headers) -> Self {
        Self { line, headers, body, chunked, trailers }
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.line
    }

    pub fn method(&self) -> &Method {
        self.line.method()
    }

    pub fn uri(&self) -> &Uri {
        self.line.uri()
    }

    /// Path component of the URI, without the query string.
    pub fn path(&self) -> &str {
        self.line.uri().path()
    }

    pub fn query(&self) -> Option<&str> {
        self.line.uri().query()
    }

    pub fn version(&self) -> Version {
        self.line.version()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Trailer fields that followed a chunked body.
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Length of the body in bytes.
    ///
    /// Request bodies are always framed by what the head declares, so for a
    /// decoded fixed-length request this is the `Content-Length` value, for
    /// a chunked one the sum of all chunk sizes.
    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    /// Whether the body was (or will be) sent with chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// HTTP/1.1 defaults to persistent connections unless `Connection: close`
    /// is present; HTTP/1.0 needs an explicit `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        if self.headers.has_token(CONNECTION, "close") {
            return false;
        }
        self.version() == Version::HTTP_11 || self.headers.has_token(CONNECTION, "keep-alive")
    }

    pub fn expects_continue(&self) -> bool {
        self.version() == Version::HTTP_11
            && self.headers.get(EXPECT).is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"100-continue"))
    }

    pub fn is_websocket_upgrade(&self) -> bool {
        self.headers.get(UPGRADE).is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"websocket"))
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

    pub fn set_chunked(&mut self, chunked: bool) {
        self.chunked = chunked;
    }

    /// Appends a header and returns the request, for building requests inline.
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
    fn parse_request_line() {
        let line = RequestLine::parse(Bytes::from_static(b"GET /index/?a=1&b=2 HTTP/1.1")).unwrap();
        assert_eq!(line.method(), &Method::GET);
        assert_eq!(line.uri().path(), "/index/");
        assert_eq!(line.uri().query(), Some("a=1&b=2"));
        assert_eq!(line.version(), Version::HTTP_11);
    }

    #[test]
    fn parse_request_line_extra_whitespace() {
        let line = RequestLine::parse(Bytes::from_static(b"PROPFIND \t /dav  HTTP/1.0 ")).unwrap();
        assert_eq!(line.method().as_str(), "PROPFIND");
        assert_eq!(line.uri().path(), "/dav");
        assert_eq!(line.version(), Version::HTTP_10);
    }

    #[test]
    fn reject_bad_request_lines() {
        assert!(matches!(
            RequestLine::parse(Bytes::from_static(b"GET /")),
            Err(ProtocolError::InvalidStartLine { .. })
        ));
        assert!(matches!(
            RequestLine::parse(Bytes::from_static(b"GET / HTTP/1.1 extra")),
            Err(ProtocolError::InvalidStartLine { .. })
        ));
        assert!(matches!(
            RequestLine::parse(Bytes::from_static(b"BREW /pot HTTP/1.1")),
            Err(ProtocolError::InvalidMethod { .. })
        ));
        assert!(matches!(
            RequestLine::parse(Bytes::from_static(b"get / HTTP/1.1")),
            Err(ProtocolError::InvalidMethod { .. })
        ));
        assert!(matches!(
            RequestLine::parse(Bytes::from_static(b"GET / HTTP/2.0")),
            Err(ProtocolError::InvalidVersion { .. })
        ));
        assert!(matches!(
            RequestLine::parse(Bytes::from_static(b"GET /a b HTTP/1.1")),
            Err(ProtocolError::InvalidStartLine { .. })
        ));
    }

    #[test]
    fn keep_alive_rules() {
        let request = Request::get("/");
        assert!(request.is_keep_alive());

        let request = Request::get("/").with_header(CONNECTION, HeaderValue::from_static("close"));
        assert!(!request.is_keep_alive());

        let mut request = Request::get("/");
        request.set_version(Version::HTTP_10);
        assert!(!request.is_keep_alive());

        let mut request = Request::get("/").with_header(CONNECTION, HeaderValue::from_static("Keep-Alive"));
        request.set_version(Version::HTTP_10);
        assert!(request.is_keep_alive());
    }

    #[test]
    fn expect_and_upgrade() {
        let request = Request::post("/upload", "x").with_header(EXPECT, HeaderValue::from_static("100-Continue"));
        assert!(request.expects_continue());
        assert_eq!(request.content_length(), 1);

        let request = Request::get("/ws").with_header(UPGRADE, HeaderValue::from_static("WebSocket"));
        assert!(request.is_websocket_upgrade());
    }
}
