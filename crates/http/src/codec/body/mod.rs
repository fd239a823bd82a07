//! Body framing helpers: fixed-length accumulation and the chunked coding.

mod body_buffer;
mod chunked_decoder;
mod chunked_encoder;

pub(crate) use body_buffer::BodyBuffer;
pub(crate) use chunked_decoder::{parse_chunk_size, read_chunk_delimiter};
pub(crate) use chunked_encoder::encode_chunked_body;
