//! HTTP request decoder.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use pipeline_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"GET /index.html HTTP/1.1\r\nHo"[..]);
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.extend_from_slice(b"st: example.com\r\n\r\n");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.path(), "/index.html");
//! assert_eq!(request.headers().len(), 1);
//! ```

use bytes::Bytes;
use http::Version;
use http::header::EXPECT;

use crate::codec::message_decoder::{MessageDecoder, MessageKind, StartLine};
use crate::protocol::{Headers, ProtocolError, Request, RequestLine};

/// Decodes requests from the bytes a client sends.
pub type RequestDecoder = MessageDecoder<RequestLine>;

impl StartLine for RequestLine {
    type Message = Request;

    const KIND: MessageKind = MessageKind::Request;

    fn parse(line: Bytes) -> Result<Self, ProtocolError> {
        RequestLine::parse(line)
    }

    fn expects_continue(&self, headers: &Headers) -> bool {
        self.version() == Version::HTTP_11
            && headers.get(EXPECT).is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"100-continue"))
    }

    fn into_message(self, headers: Headers, body: Bytes, chunked: bool, trailers: Headers) -> Request {
        Request::from_parts(self, headers, body, chunked, trailers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::limits::DecoderLimits;
    use crate::codec::message_decoder::DecodeState;
    use crate::protocol::ParseError;
    use bytes::BytesMut;
    use http::Method;
    use indoc::indoc;
    use proptest::prelude::*;
    use tokio_util::codec::Decoder;

    const CHROME_GET: &str = indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        Connection: keep-alive
        Cache-Control: max-age=0
        Upgrade-Insecure-Requests: 1
        User-Agent: Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36
        Accept: text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8
        Accept-Encoding: gzip, deflate, br
        Accept-Language: zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7

        "##};

    const FORM_POST: &str = concat!(
        "POST /submit HTTP/1.1\r\n",
        "Host: 127.0.0.1:8080\r\n",
        "Connection: keep-alive\r\n",
        "Content-Length: 46\r\n",
        "Cache-Control: max-age=0\r\n",
        "Origin: http://127.0.0.1:8080\r\n",
        "Content-Type: application/x-www-form-urlencoded\r\n",
        "User-Agent: curl/8.4.0\r\n",
        "Accept: */*\r\n",
        "Referer: http://127.0.0.1:8080/form\r\n",
        "Accept-Encoding: gzip, deflate\r\n",
        "Accept-Language: en-US\r\n",
        "Cookie: session=abc; theme=dark\r\n",
        "X-Request-Id: 42\r\n",
        "\r\n",
        "hello=world&pipeline=true&chunk=false&depth=46",
    );

    const CHUNKED_POST: &str = concat!(
        "POST /upload HTTP/1.1\r\n",
        "Host: example.com\r\n",
        "Transfer-Encoding: chunked\r\n",
        "Trailer: X-Checksum\r\n",
        "\r\n",
        "5\r\nhello\r\n",
        "7;ext=1\r\n, world\r\n",
        "0\r\n",
        "X-Checksum: 1234\r\n",
        "\r\n",
    );

    fn decode_all(input: &[u8]) -> Vec<Request> {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from(input);
        let mut requests = vec![];
        while let Some(request) = decoder.decode(&mut buf).unwrap() {
            requests.push(request);
        }
        assert!(buf.is_empty());
        requests
    }

    #[test]
    fn from_chrome() {
        let requests = decode_all(CHROME_GET.as_bytes());
        assert_eq!(requests.len(), 1);
        let request = &requests[0];

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.path(), "/index/");
        assert_eq!(request.query(), Some("a=1&b=2&a=3"));

        assert_eq!(request.headers().len(), 8);
        assert_eq!(request.headers().get_str("accept-encoding"), Some("gzip, deflate, br"));
        assert_eq!(request.content_length(), 0);
        assert!(request.body().is_empty());
        assert!(!request.is_chunked());
        assert!(request.is_keep_alive());
    }

    #[test]
    fn fixed_length_body() {
        let requests = decode_all(FORM_POST.as_bytes());
        let request = &requests[0];

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.headers().len(), 13);
        assert_eq!(request.body().len(), 46);
        assert_eq!(request.content_length(), 46);
        assert_eq!(&request.body()[..], b"hello=world&pipeline=true&chunk=false&depth=46");
    }

    #[test]
    fn chunked_body_with_trailer() {
        let mut decoder = RequestDecoder::new();
        let bytes = CHUNKED_POST.as_bytes();

        // everything but the final empty line
        let mut buf = BytesMut::from(&bytes[..bytes.len() - 2]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.state(), DecodeState::ChunkTrailer);

        buf.extend_from_slice(b"\r\n");
        let request = decoder.decode(&mut buf).unwrap().unwrap();

        assert!(request.is_chunked());
        assert_eq!(&request.body()[..], b"hello, world");
        assert_eq!(request.content_length(), 12);
        assert_eq!(request.trailers().get_str("x-checksum"), Some("1234"));
        assert_eq!(decoder.state(), DecodeState::StartLine);
    }

    #[test]
    fn pipelined_back_to_back() {
        let mut input = Vec::new();
        input.extend_from_slice(FORM_POST.as_bytes());
        input.extend_from_slice(b"GET /second HTTP/1.1\r\nHost: a\r\n\r\n");
        input.extend_from_slice(CHUNKED_POST.as_bytes());
        input.extend_from_slice(b"GET /fourth HTTP/1.0\r\n\r\n");

        let requests = decode_all(&input);
        let paths: Vec<_> = requests.iter().map(Request::path).collect();
        assert_eq!(paths, vec!["/submit", "/second", "/upload", "/fourth"]);
        assert_eq!(requests[3].version(), Version::HTTP_10);
        assert!(!requests[3].is_keep_alive());
    }

    #[test]
    fn byte_by_byte() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::new();
        let mut decoded = None;

        for (i, b) in FORM_POST.as_bytes().iter().enumerate() {
            buf.extend_from_slice(&[*b]);
            if let Some(request) = decoder.decode(&mut buf).unwrap() {
                assert_eq!(i, FORM_POST.len() - 1, "completed before the last byte");
                decoded = Some(request);
            }
        }

        assert_eq!(decoded, decode_all(FORM_POST.as_bytes()).pop());
    }

    #[test]
    fn start_line_too_large() {
        let limits = DecoderLimits::default().max_line_size(32);
        let mut decoder = RequestDecoder::with_limits(limits);
        let mut buf = BytesMut::from(format!("GET /{} HTTP/1.1", "a".repeat(64)).as_bytes());

        let err = decoder.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::LineTooLarge { in_start_line: true, max_size: 32, .. }));
        assert_eq!(decoder.state(), DecodeState::Error);

        // the rest of the request would have completed it, but the decoder stays failed
        buf.extend_from_slice(b"\r\n\r\n");
        assert!(matches!(
            decoder.decode(&mut buf),
            Err(ParseError::Protocol { source: ProtocolError::DecoderFailed })
        ));
    }

    #[test]
    fn header_line_too_large() {
        let limits = DecoderLimits::default().max_line_size(32);
        let mut decoder = RequestDecoder::with_limits(limits);
        let mut buf = BytesMut::from(format!("GET / HTTP/1.1\r\nX-Long: {}\r\n\r\n", "b".repeat(32)).as_bytes());

        let err = decoder.decode(&mut buf).unwrap_err();
        assert!(matches!(err, ParseError::LineTooLarge { in_start_line: false, .. }));
    }

    #[test]
    fn too_many_headers() {
        let limits = DecoderLimits::default().max_headers(2);
        let mut decoder = RequestDecoder::with_limits(limits);
        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n"[..]);

        assert!(matches!(decoder.decode(&mut buf), Err(ParseError::TooManyHeaders { max_num: 2 })));
    }

    #[test]
    fn malformed_chunk_size() {
        let mut decoder = RequestDecoder::new();
        let mut buf =
            BytesMut::from(&b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nxyz\r\nhello\r\n0\r\n\r\n"[..]);

        assert!(matches!(
            decoder.decode(&mut buf),
            Err(ParseError::Protocol { source: ProtocolError::InvalidChunkSize })
        ));
    }

    #[test]
    fn missing_chunk_delimiter() {
        let mut decoder = RequestDecoder::new();
        let mut buf =
            BytesMut::from(&b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nhelo\r\n0\r\n\r\n"[..]);

        assert!(matches!(
            decoder.decode(&mut buf),
            Err(ParseError::Protocol { source: ProtocolError::InvalidChunkDelimiter })
        ));
    }

    #[test]
    fn chunked_body_ceiling() {
        let limits = DecoderLimits::default().max_body_size(8);
        let mut decoder = RequestDecoder::with_limits(limits);
        let mut buf =
            BytesMut::from(&b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n5\r\nworld\r\n0\r\n\r\n"[..]);

        assert!(matches!(decoder.decode(&mut buf), Err(ParseError::TooLargeBody { current_size: 10, max_size: 8 })));
    }

    #[test]
    fn unknown_method() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from(&b"FETCH / HTTP/1.1\r\n\r\n"[..]);
        assert!(matches!(
            decoder.decode(&mut buf),
            Err(ParseError::Protocol { source: ProtocolError::InvalidMethod { .. } })
        ));
    }

    #[test]
    fn continue_requested_once() {
        let mut decoder = RequestDecoder::new();
        let mut buf =
            BytesMut::from(&b"PUT /file HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 4\r\n\r\n"[..]);

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(decoder.state(), DecodeState::BodyFixed);
        assert!(decoder.take_continue_request());
        assert!(!decoder.take_continue_request());

        buf.extend_from_slice(b"data");
        let request = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(request.expects_continue());
        assert_eq!(&request.body()[..], b"data");
    }

    #[test]
    fn eof_handling() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::new();
        assert!(decoder.decode_eof(&mut buf).unwrap().is_none());

        let mut buf = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: a\r\n\r\nGET /next HT"[..]);
        assert!(decoder.decode_eof(&mut buf).unwrap().is_some());
        assert!(matches!(
            decoder.decode_eof(&mut buf),
            Err(ParseError::Protocol { source: ProtocolError::IncompleteMessage })
        ));
    }

    proptest! {
        #[test]
        fn split_points_do_not_matter(cuts in proptest::collection::vec(0..CHUNKED_POST.len() + FORM_POST.len(), 0..8)) {
            let mut input = Vec::new();
            input.extend_from_slice(CHUNKED_POST.as_bytes());
            input.extend_from_slice(FORM_POST.as_bytes());
            let expected = decode_all(&input);

            let mut cuts = cuts;
            cuts.sort_unstable();
            cuts.push(input.len());

            let mut decoder = RequestDecoder::new();
            let mut buf = BytesMut::new();
            let mut decoded = vec![];
            let mut start = 0;
            for cut in cuts {
                buf.extend_from_slice(&input[start..cut]);
                start = cut;
                while let Some(request) = decoder.decode(&mut buf).unwrap() {
                    decoded.push(request);
                }
            }

            prop_assert_eq!(decoded, expected);
        }
    }
}
