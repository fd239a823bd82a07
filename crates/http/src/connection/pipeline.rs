//! Sans-io pipelining state of one connection.
//!
//! [`Connection`] turns reads of any size into decoded requests, hands them to
//! the handler in arrival order and keeps the shared [`ResponseSlots`] that
//! put the answers back in that order. It performs no I/O itself; the async
//! driver in [`HttpConnection`](super::HttpConnection) pumps bytes in and out.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::BytesMut;
use http::header::CONNECTION;
use http::{HeaderValue, StatusCode};
use tokio_util::codec::Decoder;
use tracing::{debug, info, trace, warn};

use crate::codec::RequestDecoder;
use crate::connection::slots::{Responder, ResponseSlots, SlotMeta};
use crate::handler::Handler;
use crate::protocol::{ParseError, Request, Response};
use crate::server::ServerConfig;

const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

#[derive(Debug)]
pub struct Connection {
    read_buf: BytesMut,
    decoder: RequestDecoder,
    /// Decoded requests not yet handed to the handler.
    pending: VecDeque<(u64, Request)>,
    next_sequence: u64,
    slots: Arc<ResponseSlots>,
    /// Response for a fatal decode error, sent after every earlier request.
    error_response: Option<(u64, Response)>,
    max_pipelined: usize,
    send_error_responses: bool,
    read_closed: bool,
    failed: bool,
    continue_pending: bool,
}

impl Connection {
    pub fn new() -> Self {
        Self::with_config(&ServerConfig::default())
    }

    pub fn with_config(config: &ServerConfig) -> Self {
        Self {
            read_buf: BytesMut::with_capacity(config.read_buffer_size),
            decoder: RequestDecoder::with_limits(config.limits),
            pending: VecDeque::new(),
            next_sequence: 0,
            slots: Arc::new(ResponseSlots::new()),
            error_response: None,
            max_pipelined: config.max_pipelined_requests.max(1),
            send_error_responses: config.send_error_responses,
            read_closed: false,
            failed: false,
            continue_pending: false,
        }
    }

    pub fn slots(&self) -> &Arc<ResponseSlots> {
        &self.slots
    }

    /// The accumulator the driver reads socket bytes into.
    pub fn read_buf_mut(&mut self) -> &mut BytesMut {
        &mut self.read_buf
    }

    /// Appends newly arrived bytes and decodes every request they complete.
    pub fn on_bytes_received(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        self.read_buf.extend_from_slice(bytes);
        self.decode_available()
    }

    /// Decodes as many requests as the buffer holds, stopping early only when
    /// the pipelining cap is reached.
    ///
    /// A decode error stops all further reading; the connection closes once
    /// the responses already owed are written.
    pub fn decode_available(&mut self) -> Result<(), ParseError> {
        while !self.failed && !self.slots.is_closed() && self.outstanding() < self.max_pipelined {
            match self.decoder.decode(&mut self.read_buf) {
                Ok(Some(request)) => self.enqueue(request),
                Ok(None) => break,
                Err(e) => {
                    self.on_decode_error(&e);
                    return Err(e);
                }
            }
        }

        if self.decoder.take_continue_request() {
            self.continue_pending = true;
        }
        self.send_continue_if_ready();
        Ok(())
    }

    /// Handles the peer closing its side. A request cut short is an error,
    /// but nothing is sent back for it.
    pub fn on_eof(&mut self) -> Result<(), ParseError> {
        self.read_closed = true;
        if self.failed {
            return Ok(());
        }

        loop {
            match self.decoder.decode_eof(&mut self.read_buf) {
                Ok(Some(request)) => self.enqueue(request),
                Ok(None) => return Ok(()),
                Err(e) => {
                    self.failed = true;
                    debug!(cause = %e, "connection closed in the middle of a request");
                    return Err(e);
                }
            }
        }
    }

    fn enqueue(&mut self, request: Request) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        trace!(sequence, method = %request.method(), uri = %request.uri(), "decoded request");

        if !request.is_keep_alive() {
            // requests already buffered are still answered
            self.read_closed = true;
        }
        self.continue_pending = false;
        self.pending.push_back((sequence, request));
    }

    fn on_decode_error(&mut self, error: &ParseError) {
        self.failed = true;
        self.read_closed = true;
        self.continue_pending = false;
        warn!(cause = %error, "can't decode request, closing connection");

        if let Some(status) = self.send_error_responses.then(|| error_status(error)).flatten() {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            let response =
                Response::new(status).with_header(CONNECTION, HeaderValue::from_static("close"));
            self.error_response = Some((sequence, response));
        }
    }

    /// Hands every pending request to `handler`, in arrival order, each with
    /// the responder for its slot.
    pub fn dispatch<H: Handler + ?Sized>(&mut self, handler: &H) {
        while let Some((sequence, request)) = self.pending.pop_front() {
            if !self.slots.reserve(sequence, SlotMeta::for_request(&request)) {
                debug!(sequence, unanswered = self.pending.len() + 1, "connection closed before dispatch");
                self.pending.clear();
                self.error_response = None;
                return;
            }
            handler.handle(request, Responder::new(Arc::clone(&self.slots), sequence));
        }

        if let Some((sequence, response)) = self.error_response.take() {
            if self.slots.reserve(sequence, SlotMeta::closing()) {
                self.slots.complete(sequence, response);
            }
        }
    }

    /// Stores the response for request `sequence` and writes every response
    /// that can now go out in order.
    pub fn on_handler_complete(&self, sequence: u64, response: Response) -> bool {
        self.slots.complete(sequence, response)
    }

    fn send_continue_if_ready(&mut self) {
        // earlier requests must be answered first, dispatched or not
        if !self.continue_pending || !self.pending.is_empty() {
            return;
        }
        if self.slots.write_interim(CONTINUE) {
            info!("receive expect request header, sent continue response");
            self.continue_pending = false;
        }
    }

    /// Retries a `100 Continue` that had to wait for earlier responses.
    pub(crate) fn after_flush(&mut self) {
        self.send_continue_if_ready();
    }

    /// Requests decoded but not yet answered on the wire.
    pub fn outstanding(&self) -> usize {
        self.pending.len() + self.slots.outstanding()
    }

    /// Whether the driver should read more bytes from the socket.
    pub fn wants_read(&self) -> bool {
        !self.read_closed && !self.slots.close_requested() && self.outstanding() < self.max_pipelined
    }

    /// Stops taking new requests. Requests already decoded are still answered.
    pub fn stop_reading(&mut self) {
        if !self.read_closed {
            debug!(outstanding = self.outstanding(), "stop reading, draining connection");
        }
        self.read_closed = true;
    }

    /// True when nothing more will be read and everything owed was written.
    pub fn is_finished(&self) -> bool {
        (self.read_closed || self.slots.close_requested())
            && self.pending.is_empty()
            && self.error_response.is_none()
            && self.slots.is_drained()
    }

    /// Invalidates all pending slots; responses arriving later are dropped.
    pub fn close(&mut self) {
        self.read_closed = true;
        self.pending.clear();
        self.slots.close();
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

/// Status sent back for a fatal decode error, if any.
fn error_status(error: &ParseError) -> Option<StatusCode> {
    match error {
        ParseError::LineTooLarge { in_start_line: true, .. } => Some(StatusCode::URI_TOO_LONG),
        ParseError::LineTooLarge { .. } | ParseError::TooManyHeaders { .. } => {
            Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
        }
        ParseError::TooLargeBody { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
        ParseError::Protocol { .. } => Some(StatusCode::BAD_REQUEST),
        ParseError::Io { .. } => None,
    }
}
