use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::connection::pipeline::Connection;
use crate::connection::slots::ResponseSlots;
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, SendError};
use crate::server::ServerConfig;

/// Drives one HTTP/1.1 connection over an async reader and writer.
///
/// `HttpConnection` is the byte pump around [`Connection`]:
/// - reads whatever the socket has and decodes every complete request
/// - dispatches requests to the handler in arrival order
/// - writes responses as soon as they are at the head of the order
/// - sends `100 Continue` when a request asks for it and nothing is pending
///
/// Reading pauses while too many requests are unanswered, after a request
/// that doesn't keep the connection alive, and after a decode error. Once a
/// stop is signalled the connection stops reading, answers what it already
/// decoded and closes, or gives up when the drain timeout expires.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: R,
    writer: W,
    connection: Connection,
    drain_timeout: Option<Duration>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, &ServerConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: &ServerConfig) -> Self {
        Self { reader, writer, connection: Connection::with_config(config), drain_timeout: config.drain_timeout }
    }

    /// Serves requests until the peer goes away, a response closes the
    /// connection or `shutdown` is cancelled and the drain completes.
    ///
    /// Returns the decode error that ended the connection, if any, after the
    /// error response and every response owed before it were written.
    pub async fn process<H>(mut self, handler: Arc<H>, shutdown: CancellationToken) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let slots = Arc::clone(self.connection.slots());
        let result = self.run(&*handler, &slots, &shutdown).await;

        // responders still held by handlers now discard their responses
        self.connection.close();
        if let Err(e) = self.writer.shutdown().await {
            debug!(cause = %e, "can't shut down connection writer");
        }
        result
    }

    async fn run<H>(&mut self, handler: &H, slots: &ResponseSlots, shutdown: &CancellationToken) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        let mut failure: Option<ParseError> = None;
        let mut draining = false;
        let mut drain_deadline: Option<Instant> = None;

        loop {
            if let Err(e) = self.connection.decode_available() {
                failure.get_or_insert(e);
            }
            self.connection.dispatch(handler);
            self.write_output().await?;

            if self.connection.is_finished() {
                break;
            }

            select! {
                biased;

                () = slots.notified() => {
                    trace!("responses ready");
                }

                read = self.reader.read_buf(self.connection.read_buf_mut()), if self.connection.wants_read() => {
                    match read {
                        Ok(0) => {
                            trace!("peer closed its side");
                            if let Err(e) = self.connection.on_eof() {
                                failure.get_or_insert(e);
                            }
                        }
                        Ok(n) => trace!(bytes = n, "read from connection"),
                        Err(e) => return Err(ParseError::io(e).into()),
                    }
                }

                () = shutdown.cancelled(), if !draining => {
                    info!(outstanding = self.connection.outstanding(), "stop signalled, draining connection");
                    self.connection.stop_reading();
                    draining = true;
                    drain_deadline = self.drain_timeout.map(|timeout| Instant::now() + timeout);
                }

                () = wait_deadline(drain_deadline), if draining => {
                    warn!(outstanding = self.connection.outstanding(), "drain timeout expired, closing connection");
                    break;
                }
            }
        }

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Writes everything the slots have serialized, then a pending
    /// `100 Continue` if the stream went idle.
    async fn write_output(&mut self) -> Result<(), SendError> {
        let mut written = false;
        loop {
            self.connection.after_flush();
            let Some(buf) = self.connection.slots().take_output() else {
                break;
            };
            self.writer.write_all(&buf).await?;
            written = true;
        }

        if written {
            self.writer.flush().await?;
        }
        Ok(())
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}
