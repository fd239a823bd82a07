//! HTTP connection handling module
//!
//! A connection is split in three layers:
//!
//! - [`Connection`]: sans-io pipelining state. Decodes requests from an
//!   accumulating buffer, numbers them, and hands them to the handler.
//! - [`ResponseSlots`] and [`Responder`]: the ordering table shared with the
//!   handlers. Responses may complete in any order and from any thread, but
//!   reach the wire in request order.
//! - [`HttpConnection`]: the async driver that pumps socket bytes through
//!   the other two on a tokio task.

mod http_connection;
mod pipeline;
mod slots;

pub use http_connection::HttpConnection;
pub use pipeline::Connection;
pub use slots::{Responder, ResponseSlots};
