//! Resumable HTTP/1.x message decoder.
//!
//! [`MessageDecoder`] is a state machine over a growing read buffer. Each call
//! to [`Decoder::decode`] continues exactly where the previous one stopped:
//! complete lines and body bytes are split off the buffer as soon as they are
//! consumed, and a partial line is never rescanned from its start.
//!
//! The same machine decodes requests and responses; only the start line and a
//! few framing defaults differ, which is what [`StartLine`] abstracts.
//!
//! # Results
//!
//! - `Ok(None)`: more bytes are needed, all progress so far is kept
//! - `Ok(Some(message))`: a message is complete and the decoder is ready for
//!   the next one, so pipelined messages decode back to back
//! - `Err(_)`: the stream is unusable, every later call fails as well

use std::mem;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::{BodyBuffer, parse_chunk_size, read_chunk_delimiter};
use crate::codec::header::{parse_header_line, payload_size};
use crate::codec::limits::DecoderLimits;
use crate::codec::line_reader::{LineReader, trim_line_end};
use crate::ensure;
use crate::protocol::{Headers, ParseError, PayloadSize, ProtocolError};

/// Which side of an exchange a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

/// The first line of a message, and how to build the finished message
/// around it.
pub trait StartLine: Sized {
    /// The complete message produced by the decoder.
    type Message;

    const KIND: MessageKind;

    /// Parses the line, terminator already stripped.
    fn parse(line: Bytes) -> Result<Self, ProtocolError>;

    /// Whether the message can never have a body, whatever its headers say.
    fn body_forbidden(&self) -> bool {
        false
    }

    /// Whether the sender waits for `100 Continue` before sending the body.
    fn expects_continue(&self, _headers: &Headers) -> bool {
        false
    }

    fn into_message(self, headers: Headers, body: Bytes, chunked: bool, trailers: Headers) -> Self::Message;
}

/// Where the decoder currently is within a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Waiting for a request line or status line.
    StartLine,
    /// Reading header lines until the empty line.
    Headers,
    /// Reading a body of known length.
    BodyFixed,
    /// Reading a chunk-size line.
    ChunkSize,
    /// Reading chunk data and the line break that closes it.
    ChunkData,
    /// Reading trailer fields after the last chunk.
    ChunkTrailer,
    /// Reading a body that ends when the connection closes.
    BodyUntilClose,
    /// A fatal error happened; nothing more can be decoded.
    Error,
}

/// Incremental decoder for one direction of an HTTP/1.x stream.
#[derive(Debug)]
pub struct MessageDecoder<S> {
    limits: DecoderLimits,
    state: DecodeState,
    lines: LineReader,
    start_line: Option<S>,
    headers: Headers,
    trailers: Headers,
    body: BodyBuffer,
    /// Bytes left in the fixed body or the current chunk.
    remaining: u64,
    chunked: bool,
    head_response: bool,
    continue_requested: bool,
}

impl<S: StartLine> MessageDecoder<S> {
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            limits,
            state: DecodeState::StartLine,
            lines: LineReader::new(),
            start_line: None,
            headers: Headers::new(),
            trailers: Headers::new(),
            body: BodyBuffer::new(),
            remaining: 0,
            chunked: false,
            head_response: false,
            continue_requested: false,
        }
    }

    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Returns true once per message when the head asked for
    /// `100 Continue` and the decoder is now waiting for its body.
    pub fn take_continue_request(&mut self) -> bool {
        mem::take(&mut self.continue_requested)
    }

    /// Treats the next messages as bodiless, as responses to HEAD are.
    pub(crate) fn set_head_response(&mut self, head_response: bool) {
        self.head_response = head_response;
    }

    fn decode_message(&mut self, src: &mut BytesMut) -> Result<Option<S::Message>, ParseError> {
        let max_line_size = self.limits.max_line_size;

        loop {
            match self.state {
                DecodeState::StartLine => {
                    let Some(line) = self.lines.read_line(src, max_line_size, true)? else {
                        return Ok(None);
                    };
                    let line = trim_line_end(line);
                    if line.is_empty() {
                        // stray line breaks between messages are ignored
                        continue;
                    }
                    self.start_line = Some(S::parse(line)?);
                    self.state = DecodeState::Headers;
                }

                DecodeState::Headers => {
                    let Some(line) = self.lines.read_line(src, max_line_size, false)? else {
                        return Ok(None);
                    };
                    let line = trim_line_end(line);
                    if line.is_empty() {
                        if let Some(message) = self.begin_body()? {
                            return Ok(Some(message));
                        }
                        continue;
                    }

                    ensure!(
                        self.headers.len() < self.limits.max_headers,
                        ParseError::too_many_headers(self.limits.max_headers)
                    );
                    let (name, value) = parse_header_line(&line)?;
                    self.headers.append(name, value);
                }

                DecodeState::BodyFixed => {
                    self.body.take(src, &mut self.remaining);
                    if self.remaining > 0 {
                        return Ok(None);
                    }
                    return self.finish().map(Some);
                }

                DecodeState::ChunkSize => {
                    let Some(line) = self.lines.read_line(src, max_line_size, false)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    trace!(size, "read chunk size");
                    if size == 0 {
                        self.state = DecodeState::ChunkTrailer;
                        continue;
                    }

                    let total = self.body.len().saturating_add(size);
                    ensure!(
                        total <= self.limits.max_body_size,
                        ParseError::too_large_body(total, self.limits.max_body_size)
                    );
                    self.remaining = size;
                    self.state = DecodeState::ChunkData;
                }

                DecodeState::ChunkData => {
                    if self.remaining > 0 {
                        self.body.take(src, &mut self.remaining);
                        if self.remaining > 0 {
                            return Ok(None);
                        }
                    }
                    if !read_chunk_delimiter(src)? {
                        return Ok(None);
                    }
                    self.state = DecodeState::ChunkSize;
                }

                DecodeState::ChunkTrailer => {
                    let Some(line) = self.lines.read_line(src, max_line_size, false)? else {
                        return Ok(None);
                    };
                    let line = trim_line_end(line);
                    if line.is_empty() {
                        return self.finish().map(Some);
                    }

                    ensure!(
                        self.trailers.len() < self.limits.max_headers,
                        ParseError::too_many_headers(self.limits.max_headers)
                    );
                    let (name, value) = parse_header_line(&line)?;
                    self.trailers.append(name, value);
                }

                DecodeState::BodyUntilClose => {
                    self.body.take_all(src);
                    ensure!(
                        self.body.len() <= self.limits.max_body_size,
                        ParseError::too_large_body(self.body.len(), self.limits.max_body_size)
                    );
                    return Ok(None);
                }

                DecodeState::Error => return Err(ProtocolError::DecoderFailed.into()),
            }
        }
    }

    /// Called on the empty line ending the header block. Returns the message
    /// right away when it has no body.
    fn begin_body(&mut self) -> Result<Option<S::Message>, ParseError> {
        let Some(start_line) = &self.start_line else {
            return Err(ProtocolError::invalid_start_line("header block without start line").into());
        };

        let body_forbidden = self.head_response || start_line.body_forbidden();
        let expects_continue = start_line.expects_continue(&self.headers);

        match payload_size(&self.headers, S::KIND, body_forbidden, &self.limits)? {
            PayloadSize::Empty => return self.finish().map(Some),
            PayloadSize::Length(length) => {
                self.remaining = length;
                self.state = DecodeState::BodyFixed;
            }
            PayloadSize::Chunked => {
                self.chunked = true;
                self.state = DecodeState::ChunkSize;
            }
            PayloadSize::UntilClose => {
                self.state = DecodeState::BodyUntilClose;
            }
        }

        self.continue_requested = expects_continue;
        Ok(None)
    }

    fn finish(&mut self) -> Result<S::Message, ParseError> {
        let start_line = self
            .start_line
            .take()
            .ok_or_else(|| ProtocolError::invalid_start_line("message without start line"))?;

        let body = self.body.finish();
        trace!(headers = self.headers.len(), body_size = body.len(), chunked = self.chunked, "decoded message");

        let message =
            start_line.into_message(mem::take(&mut self.headers), body, mem::take(&mut self.chunked), mem::take(&mut self.trailers));

        self.state = DecodeState::StartLine;
        self.remaining = 0;
        self.continue_requested = false;
        Ok(message)
    }

    fn fail(&mut self) {
        self.state = DecodeState::Error;
        self.lines.reset();
        self.start_line = None;
        self.headers.clear();
        self.trailers.clear();
        self.body.clear();
        self.continue_requested = false;
    }
}

impl<S: StartLine> Default for MessageDecoder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StartLine> Decoder for MessageDecoder<S> {
    type Item = S::Message;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let result = self.decode_message(src);
        if result.is_err() {
            self.fail();
        }
        result
    }

    /// Completes a body that runs until the connection closes. Any other
    /// partially decoded message is an error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }

        match self.state {
            DecodeState::BodyUntilClose => self.finish().map(Some),
            DecodeState::StartLine if src.is_empty() => Ok(None),
            _ => {
                self.fail();
                Err(ProtocolError::IncompleteMessage.into())
            }
        }
    }
}
