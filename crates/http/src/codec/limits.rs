use serde::Deserialize;

/// Default ceiling for a single start line, header line, chunk-size line or
/// trailer line.
pub const DEFAULT_MAX_LINE_SIZE: usize = 8 * 1024;

/// Default maximum number of header fields in one message.
pub const DEFAULT_MAX_HEADERS: usize = 100;

/// Default maximum body size, for both fixed-length and chunked bodies.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 8 * 1024 * 1024;

/// What to do with a message carrying both `Content-Length` and
/// `Transfer-Encoding: chunked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingConflict {
    /// Frame the body as chunked and ignore `Content-Length`.
    #[default]
    PreferChunked,
    /// Treat the message as malformed.
    Reject,
}

/// Size limits enforced while decoding. Exceeding any of them is
/// connection-fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderLimits {
    pub max_line_size: usize,
    pub max_headers: usize,
    pub max_body_size: u64,
    pub framing_conflict: FramingConflict,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            max_headers: DEFAULT_MAX_HEADERS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            framing_conflict: FramingConflict::default(),
        }
    }
}

impl DecoderLimits {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_line_size(mut self, max_line_size: usize) -> Self {
        self.max_line_size = max_line_size;
        self
    }

    #[must_use]
    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    #[must_use]
    pub fn framing_conflict(mut self, framing_conflict: FramingConflict) -> Self {
        self.framing_conflict = framing_conflict;
        self
    }
}
