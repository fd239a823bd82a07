//! Listener, accept loop and graceful stop.
//!
//! ```no_run
//! use pipeline_http::handler::make_handler;
//! use pipeline_http::protocol::{Request, Response};
//! use pipeline_http::server::{Server, ServerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::builder()
//!     .address("127.0.0.1:8080")
//!     .config(ServerConfig::default().max_pipelined_requests(64))
//!     .handler(make_handler(|request: Request| async move {
//!         Ok::<_, std::io::Error>(Response::ok(request.into_body()))
//!     }))
//!     .build()?;
//!
//! let handle = server.start().await?;
//! tokio::signal::ctrl_c().await?;
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod listener;

pub use config::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAX_PIPELINED_REQUESTS, DEFAULT_READ_BUFFER_SIZE, ServerConfig};
pub use listener::{Server, ServerBuildError, ServerBuilder, ServerError, ServerHandle};
