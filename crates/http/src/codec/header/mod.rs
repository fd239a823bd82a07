//! Header block decoding and encoding.
//!
//! The decoding half parses single header lines and decides body framing once
//! a block is complete; the encoding half writes a block with framing headers
//! derived from the body.

mod header_decoder;
mod header_encoder;

pub(crate) use header_decoder::{parse_header_line, payload_size};
pub(crate) use header_encoder::{FastWrite, Framing, INIT_HEADER_SIZE, encode_headers};
