//! A pipelining HTTP/1.1 server core
//!
//! This crate decodes HTTP/1.1 requests from a byte stream with a resumable
//! state machine, hands each one to a handler as soon as it is complete, and
//! writes the responses back in request order no matter in which order the
//! handlers finish. Clients may send many requests without waiting, and one
//! slow request never stops the server from reading and dispatching the
//! ones behind it.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use pipeline_http::connection::Responder;
//! use pipeline_http::protocol::{Request, Response};
//! use pipeline_http::server::Server;
//! use tracing::info;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder().address("127.0.0.1:8080").handler(hello_world).build()?;
//!     let handle = server.start().await?;
//!     info!(address = %handle.local_addr(), "serving");
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.stop().await;
//!     Ok(())
//! }
//!
//! fn hello_world(request: Request, responder: Responder) {
//!     tokio::spawn(async move {
//!         if request.path() == "/slow" {
//!             tokio::time::sleep(Duration::from_millis(200)).await;
//!         }
//!         responder.send(Response::ok("Hello World!\r\n"));
//!     });
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: requests, responses, headers and errors
//! - [`codec`]: the decoder state machine, encoders and a client codec
//! - [`connection`]: pipelining state, ordered response slots and the async
//!   driver of one connection
//! - [`handler`]: the handler contract and adapters for async and blocking
//!   functions
//! - [`server`]: listener, accept loop and graceful stop
//!
//! ## Error Handling
//!
//! - [`protocol::ParseError`]: decode errors, all of them connection-fatal
//! - [`protocol::SendError`]: response encoding and writing errors
//! - [`protocol::HttpError`]: top-level error of a connection
//!
//! # Limitations
//!
//! - HTTP/1.x only, no TLS
//! - Bodies are buffered whole before the handler sees the request
//! - Handlers have no per-request timeout; a response that never comes
//!   blocks every later response on its connection

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
