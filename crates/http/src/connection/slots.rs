//! Per-connection response ordering.
//!
//! Every dispatched request reserves a slot, numbered by its sequence on the
//! connection. Handlers fill slots in any order and from any thread; only the
//! contiguous run of filled slots at the head is serialized into the output
//! buffer, so responses leave in request order.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::BytesMut;
use http::header::CONNECTION;
use http::{HeaderValue, Version};
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tokio_util::codec::Encoder;
use tracing::{debug, error, trace, warn};

use crate::codec::ResponseEncoder;
use crate::protocol::{Request, Response};

/// What the connection needs to remember about a request until its response
/// is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotMeta {
    pub(crate) keep_alive: bool,
    pub(crate) head_request: bool,
    pub(crate) http10: bool,
}

impl SlotMeta {
    pub(crate) fn for_request(request: &Request) -> Self {
        Self {
            keep_alive: request.is_keep_alive(),
            head_request: request.method() == http::Method::HEAD,
            http10: request.version() == Version::HTTP_10,
        }
    }

    /// Meta for a response the connection generates itself before closing.
    pub(crate) fn closing() -> Self {
        Self { keep_alive: false, head_request: false, http10: false }
    }
}

#[derive(Debug)]
enum Slot {
    Waiting(SlotMeta),
    Ready(SlotMeta, Response),
}

#[derive(Debug, Default)]
struct SlotTable {
    /// Sequence number of `slots[0]`.
    head: u64,
    slots: VecDeque<Slot>,
    out: BytesMut,
    encoder: ResponseEncoder,
    closed: bool,
    close_requested: bool,
}

impl SlotTable {
    fn next_sequence(&self) -> u64 {
        self.head + self.slots.len() as u64
    }

    /// Serializes every ready slot at the head. Returns true if anything was
    /// written to the output buffer.
    fn flush(&mut self) -> bool {
        let mut flushed = false;

        while matches!(self.slots.front(), Some(Slot::Ready(..))) {
            let Some(Slot::Ready(meta, response)) = self.slots.pop_front() else {
                break;
            };
            let sequence = self.head;
            self.head += 1;

            let response = prepare_response(response, meta);
            if !meta.keep_alive || response.headers().has_token(CONNECTION, "close") {
                self.close_requested = true;
            }

            self.encoder.omit_body(meta.head_request);
            let written = self.out.len();
            match self.encoder.encode(response, &mut self.out) {
                Ok(()) => trace!(sequence, "response ready to write"),
                Err(e) => {
                    // the stream can't skip a response without breaking order,
                    // so only what was encoded before it still goes out
                    error!(sequence, cause = %e, "can't encode response, closing connection");
                    self.out.truncate(written);
                    self.close_requested = true;
                    self.closed = true;
                    self.slots.clear();
                }
            }
            flushed = true;
        }

        flushed
    }
}

/// Adjusts connection management headers to what the connection will do.
fn prepare_response(mut response: Response, meta: SlotMeta) -> Response {
    if meta.http10 {
        // HTTP/1.0 peers can't parse chunked bodies
        response.set_chunked(false);
    }

    if !meta.keep_alive {
        if !response.headers().has_token(CONNECTION, "close") {
            response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
        }
    } else if meta.http10 && !response.headers().contains(CONNECTION) {
        response.headers_mut().insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    }

    response
}

/// The ordering state shared between a connection and the responders of its
/// in-flight requests.
#[derive(Debug, Default)]
pub struct ResponseSlots {
    table: Mutex<SlotTable>,
    notify: Notify,
}

impl ResponseSlots {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotTable> {
        self.table.lock()
    }

    /// Reserves the slot for `sequence`, which must be the next one in order.
    pub(crate) fn reserve(&self, sequence: u64, meta: SlotMeta) -> bool {
        let mut table = self.lock();
        if table.closed {
            return false;
        }
        debug_assert_eq!(sequence, table.next_sequence(), "slots must be reserved in request order");
        table.slots.push_back(Slot::Waiting(meta));
        true
    }

    /// Fills the slot for `sequence` and writes every response that is now
    /// at the head of the order.
    ///
    /// Returns false if the response was discarded because the connection is
    /// closed or the slot is unknown or already filled.
    pub fn complete(&self, sequence: u64, response: Response) -> bool {
        let mut table = self.lock();
        if table.closed {
            debug!(sequence, status = %response.status(), "connection already closed, discarding response");
            return false;
        }

        let index = sequence
            .checked_sub(table.head)
            .and_then(|offset| usize::try_from(offset).ok())
            .filter(|index| *index < table.slots.len());
        let Some(index) = index else {
            warn!(sequence, "no pending slot for response, discarding it");
            return false;
        };

        let meta = match &table.slots[index] {
            Slot::Waiting(meta) => *meta,
            Slot::Ready(..) => {
                warn!(sequence, "slot already has a response, discarding the second one");
                return false;
            }
        };
        table.slots[index] = Slot::Ready(meta, response);

        let flushed = table.flush();
        drop(table);

        if flushed {
            self.notify.notify_one();
        }
        true
    }

    /// Queues an interim response such as `100 Continue`, but only while
    /// nothing else is waiting to be written.
    pub(crate) fn write_interim(&self, bytes: &[u8]) -> bool {
        let mut table = self.lock();
        if table.closed || !table.slots.is_empty() || !table.out.is_empty() {
            return false;
        }
        table.out.extend_from_slice(bytes);
        true
    }

    /// Takes whatever is ready to go on the wire.
    pub(crate) fn take_output(&self) -> Option<BytesMut> {
        let mut table = self.lock();
        if table.out.is_empty() { None } else { Some(table.out.split()) }
    }

    /// Number of reserved slots whose response hasn't been serialized yet.
    pub fn outstanding(&self) -> usize {
        self.lock().slots.len()
    }

    /// True when every reserved slot has been written out.
    pub(crate) fn is_drained(&self) -> bool {
        let table = self.lock();
        table.slots.is_empty() && table.out.is_empty()
    }

    /// True once a written response means the connection must close.
    pub(crate) fn close_requested(&self) -> bool {
        self.lock().close_requested
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Invalidates every pending slot. Later completions are discarded.
    pub(crate) fn close(&self) {
        let mut table = self.lock();
        if !table.slots.is_empty() {
            debug!(pending = table.slots.len(), "closing connection with unanswered requests");
        }
        table.closed = true;
        table.slots.clear();
        table.out.clear();
    }

    /// Waits until new output is ready.
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// The completion callback handed to a handler with each request.
///
/// Sending consumes the responder, so each request is answered at most once.
/// A responder dropped without sending leaves its slot waiting, which blocks
/// every later response on the same connection.
#[derive(Debug)]
pub struct Responder {
    slots: Arc<ResponseSlots>,
    sequence: u64,
    sent: bool,
}

impl Responder {
    pub(crate) fn new(slots: Arc<ResponseSlots>, sequence: u64) -> Self {
        Self { slots, sequence, sent: false }
    }

    /// Position of the request on its connection, starting at zero.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether the connection was closed, in which case a response would be
    /// discarded.
    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }

    pub fn send(mut self, response: Response) {
        self.sent = true;
        self.slots.complete(self.sequence, response);
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.sent && !self.slots.is_closed() {
            warn!(sequence = self.sequence, "responder dropped without a response, later responses on this connection stay blocked");
        }
    }
}
