use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors raised while decoding a message. Every variant is connection-fatal.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A start line, header line, chunk-size line or trailer line grew past the
    /// configured ceiling before its terminator arrived.
    #[error("line too large, current: {current_size} exceed the limit {max_size}")]
    LineTooLarge { current_size: usize, max_size: usize, in_start_line: bool },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("body size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeBody { current_size: u64, max_size: u64 },

    #[error("protocol error: {source}")]
    Protocol {
        #[from]
        source: ProtocolError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn line_too_large(current_size: usize, max_size: usize, in_start_line: bool) -> Self {
        Self::LineTooLarge { current_size, max_size, in_start_line }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn too_large_body(current_size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { current_size, max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true for the oversized-line family of errors.
    pub fn is_line_too_large(&self) -> bool {
        matches!(self, Self::LineTooLarge { .. })
    }

    /// Returns true for malformed-input errors.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

/// Malformed framing or syntax. Partial framing can't be resynchronized, so
/// the decoder never recovers from any of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid start line: {reason}")]
    InvalidStartLine { reason: String },

    #[error("unsupported http method: {method}")]
    InvalidMethod { method: String },

    #[error("unsupported http version: {version}")]
    InvalidVersion { version: String },

    #[error("invalid http uri: {uri}")]
    InvalidUri { uri: String },

    #[error("invalid status code: {status}")]
    InvalidStatus { status: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid chunk size line")]
    InvalidChunkSize,

    #[error("invalid chunk delimiter, expect CRLF after chunk data")]
    InvalidChunkDelimiter,

    #[error("both transfer-encoding chunked and content-length present")]
    AmbiguousFraming,

    #[error("unsupported transfer-encoding: {coding}")]
    UnsupportedTransferEncoding { coding: String },

    #[error("connection closed in the middle of a message")]
    IncompleteMessage,

    #[error("decoder already failed on this stream")]
    DecoderFailed,
}

impl ProtocolError {
    pub fn invalid_start_line<S: ToString>(str: S) -> Self {
        Self::InvalidStartLine { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_response<S: ToString>(str: S) -> Self {
        Self::InvalidResponse { reason: str.to_string() }
    }

    pub fn invalid_request<S: ToString>(str: S) -> Self {
        Self::InvalidRequest { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
