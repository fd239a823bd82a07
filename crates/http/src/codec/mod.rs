//! HTTP codec module for encoding and decoding HTTP/1.x messages
//!
//! Everything here is sans-io: decoders consume a `BytesMut` read buffer and
//! encoders append to a write buffer, through the `tokio_util::codec` traits.
//!
//! # Architecture
//!
//! - Decoding:
//!   - [`MessageDecoder`]: the resumable state machine, see [`DecodeState`]
//!   - [`RequestDecoder`] / [`ResponseDecoder`]: its server and client forms
//!   - [`DecoderLimits`]: line, header count and body ceilings
//!
//! - Encoding:
//!   - [`ResponseEncoder`]: status line, headers and body of a response
//!   - [`RequestEncoder`]: request line, headers and body of a request
//!
//! - [`ClientCodec`]: request encoder plus response decoder, for use with
//!   `tokio_util::codec::Framed`
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use pipeline_http::codec::{RequestDecoder, ResponseEncoder};
//! use pipeline_http::protocol::Response;
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let mut request_buffer = BytesMut::from(&b"GET / HTTP/1.1\r\n\r\n"[..]);
//! let request = decoder.decode(&mut request_buffer).unwrap().unwrap();
//! assert_eq!(request.path(), "/");
//!
//! let mut encoder = ResponseEncoder::new();
//! let mut response_buffer = BytesMut::new();
//! encoder.encode(Response::ok("hi"), &mut response_buffer).unwrap();
//! assert_eq!(&response_buffer[..], b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nhi");
//! ```

mod body;
mod client_codec;
mod header;
mod limits;
mod line_reader;
mod message_decoder;
mod request_decoder;
mod request_encoder;
mod response_decoder;
mod response_encoder;

pub use client_codec::ClientCodec;
pub use limits::{DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_HEADERS, DEFAULT_MAX_LINE_SIZE, DecoderLimits, FramingConflict};
pub use message_decoder::{DecodeState, MessageDecoder, MessageKind, StartLine};
pub use request_decoder::RequestDecoder;
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
pub use response_encoder::ResponseEncoder;
