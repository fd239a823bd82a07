//! Request handler contract and adapters.
//!
//! A [`Handler`] receives each decoded request together with the
//! [`Responder`] for its slot and may answer from anywhere, at any time. The
//! connection keeps decoding and dispatching later requests meanwhile, and
//! puts the responses back in request order.
//!
//! Plain closures `Fn(Request, Responder)` are handlers. [`make_handler`]
//! adapts an async function and [`make_blocking_handler`] a blocking one.

use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use tracing::error;

use crate::connection::Responder;
use crate::protocol::{Request, Response};

pub trait Handler: Send + Sync + 'static {
    /// Called on the connection task, in request order. Must not block.
    fn handle(&self, request: Request, responder: Responder);
}

impl<F> Handler for F
where
    F: Fn(Request, Responder) + Send + Sync + 'static,
{
    fn handle(&self, request: Request, responder: Responder) {
        self(request, responder);
    }
}

/// Runs an async function per request on its own tokio task.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Fut, Err> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Err>> + Send + 'static,
    Err: Into<Box<dyn Error + Send + Sync>>,
{
    fn handle(&self, request: Request, responder: Responder) {
        let future = (self.f)(request);
        tokio::spawn(async move {
            let response = match future.await {
                Ok(response) => response,
                Err(e) => {
                    let e = e.into();
                    error!(sequence = responder.sequence(), cause = %e, "handle request error");
                    Response::new(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };
            responder.send(response);
        });
    }
}

pub fn make_handler<F, Fut, Err>(f: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut,
    Fut: Future<Output = Result<Response, Err>>,
    Err: Into<Box<dyn Error + Send + Sync>>,
{
    HandlerFn { f }
}

/// Runs a blocking function per request on tokio's blocking pool.
#[derive(Debug)]
pub struct BlockingHandlerFn<F> {
    f: Arc<F>,
}

impl<F> Handler for BlockingHandlerFn<F>
where
    F: Fn(Request) -> Response + Send + Sync + 'static,
{
    fn handle(&self, request: Request, responder: Responder) {
        let f = Arc::clone(&self.f);
        tokio::task::spawn_blocking(move || responder.send(f(request)));
    }
}

pub fn make_blocking_handler<F>(f: F) -> BlockingHandlerFn<F>
where
    F: Fn(Request) -> Response,
{
    BlockingHandlerFn { f: Arc::new(f) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use std::io;

    fn output(connection: &Connection) -> String {
        connection.slots().take_output().map(|buf| String::from_utf8(buf.to_vec()).unwrap()).unwrap_or_default()
    }

    #[test]
    fn closure_is_a_handler() {
        let mut connection = Connection::new();
        connection.on_bytes_received(b"GET /hi HTTP/1.1\r\n\r\n").unwrap();
        connection.dispatch(&|request: Request, responder: Responder| {
            responder.send(Response::ok(format!("path={}", request.path())));
        });

        assert_eq!(output(&connection), "HTTP/1.1 200 OK\r\ncontent-length: 7\r\n\r\npath=/hi");
    }

    #[tokio::test]
    async fn async_handler() {
        let mut connection = Connection::new();
        connection.on_bytes_received(b"POST /echo HTTP/1.1\r\nContent-Length: 4\r\n\r\nping").unwrap();

        let handler = make_handler(|request: Request| async move { Ok::<_, io::Error>(Response::ok(request.into_body())) });
        connection.dispatch(&handler);
        connection.slots().notified().await;

        assert!(output(&connection).ends_with("\r\n\r\nping"));
    }

    #[tokio::test]
    async fn async_handler_error_is_answered_with_500() {
        let mut connection = Connection::new();
        connection.on_bytes_received(b"GET /fail HTTP/1.1\r\n\r\n").unwrap();

        let handler = make_handler(|_request: Request| async { Err::<Response, _>("boom") });
        connection.dispatch(&handler);
        connection.slots().notified().await;

        assert_eq!(output(&connection), "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn blocking_handler() {
        let mut connection = Connection::new();
        connection.on_bytes_received(b"GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n").unwrap();

        let handler = make_blocking_handler(|request: Request| {
            if request.path() == "/a" {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
            Response::ok(request.path().to_owned())
        });
        connection.dispatch(&handler);

        while connection.outstanding() > 0 {
            connection.slots().notified().await;
        }
        let written = output(&connection);
        assert!(written.find("/a").unwrap() < written.find("/b").unwrap());
    }
}
