use std::collections::VecDeque;

use bytes::BytesMut;
use http::Method;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::limits::DecoderLimits;
use crate::codec::request_encoder::RequestEncoder;
use crate::codec::response_decoder::ResponseDecoder;
use crate::protocol::{ParseError, Request, Response, SendError};

/// Client side codec: encodes requests and decodes the responses to them.
///
/// Requests may be pipelined. The codec remembers which in-flight requests
/// were HEAD so their responses are decoded without a body. Interim 1xx
/// responses are yielded as they arrive and do not count as the final answer.
#[derive(Debug, Default)]
pub struct ClientCodec {
    encoder: RequestEncoder,
    decoder: ResponseDecoder,
    in_flight: VecDeque<bool>,
}

impl ClientCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self { encoder: RequestEncoder::new(), decoder: ResponseDecoder::with_limits(limits), in_flight: VecDeque::new() }
    }

    /// Number of requests sent whose final response has not been decoded.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn prepare(&mut self) {
        let head = self.in_flight.front().copied().unwrap_or(false);
        self.decoder.set_head_response(head);
    }

    fn answered(&mut self, response: Option<&Response>) {
        if response.is_some_and(|r| !r.status().is_informational()) {
            self.in_flight.pop_front();
        }
    }
}

impl Encoder<Request> for ClientCodec {
    type Error = SendError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let head = item.method() == Method::HEAD;
        self.encoder.encode(item, dst)?;
        self.in_flight.push_back(head);
        Ok(())
    }
}

impl Decoder for ClientCodec {
    type Item = Response;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.prepare();
        let response = self.decoder.decode(src)?;
        self.answered(response.as_ref());
        Ok(response)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.prepare();
        let response = self.decoder.decode_eof(src)?;
        self.answered(response.as_ref());
        Ok(response)
    }
}
