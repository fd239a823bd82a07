//! Core HTTP message types.
//!
//! This module holds the values that flow between the codec, the connection
//! and user handlers:
//!
//! - **Messages** ([`request`], [`response`]): fully buffered requests and
//!   responses
//!   - [`Request`] / [`RequestLine`]
//!   - [`Response`] / [`StatusLine`]
//!
//! - **Headers** ([`header`]): [`Headers`] keeps fields in arrival order,
//!   duplicates included, with case-insensitive lookup
//!
//! - **Framing** ([`message`]): [`PayloadSize`] describes how a body is
//!   delimited on the wire
//!
//! - **Error Handling** ([`error`]):
//!   - [`HttpError`]: top level error type
//!   - [`ParseError`]: decoding errors, always connection fatal
//!   - [`ProtocolError`]: malformed syntax or framing
//!   - [`SendError`]: response encoding and writing errors
//!
//! Bodies are delivered whole. A message reaches a handler only after its
//! last body byte (and any trailer) has been decoded.

pub mod header;
pub use header::Headers;

pub mod message;
pub use message::PayloadSize;

pub mod request;
pub use request::Request;
pub use request::RequestLine;

pub mod response;
pub use response::Response;
pub use response::StatusLine;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::ProtocolError;
pub use error::SendError;
