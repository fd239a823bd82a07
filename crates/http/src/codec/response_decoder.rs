//! HTTP response decoder, for the client side of a connection.

use bytes::Bytes;

use crate::codec::message_decoder::{MessageDecoder, MessageKind, StartLine};
use crate::protocol::{Headers, ProtocolError, Response, StatusLine};

/// Decodes responses from the bytes a server sends.
///
/// A response without `Content-Length` or chunked framing is read until the
/// connection closes and is completed by `decode_eof`.
pub type ResponseDecoder = MessageDecoder<StatusLine>;

impl StartLine for StatusLine {
    type Message = Response;

    const KIND: MessageKind = MessageKind::Response;

    fn parse(line: Bytes) -> Result<Self, ProtocolError> {
        StatusLine::parse(line)
    }

    fn body_forbidden(&self) -> bool {
        let status = self.status();
        status.is_informational() || status.as_u16() == 204 || status.as_u16() == 304
    }

    fn into_message(self, headers: Headers, body: Bytes, chunked: bool, trailers: Headers) -> Response {
        Response::from_parts(self, headers, body, chunked, trailers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use http::StatusCode;
    use indoc::indoc;
    use tokio_util::codec::Decoder;

    use crate::protocol::ParseError;

    #[test]
    fn chunked_response() {
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        // the zero chunk alone does not complete the message
        buf.extend_from_slice(b"0\r\n");
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"\r\n");
        let response = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.reason(), "OK");
        assert!(response.is_chunked());
        assert_eq!(&response.body()[..], b"hello");
        assert_eq!(response.content_length(), 5);
    }

    #[test]
    fn fixed_length_response() {
        let input = indoc! {"
            HTTP/1.0 404 Not Found
            Content-Type: text/plain
            Content-Length: 9

            not found"};
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(input);

        let response = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.reason(), "Not Found");
        assert_eq!(response.headers().len(), 2);
        assert_eq!(&response.body()[..], b"not found");
    }

    #[test]
    fn body_until_close() {
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nServer: old\r\n\r\nstreamed "[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"until close");
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        let response = decoder.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(&response.body()[..], b"streamed until close");
        assert!(decoder.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn bodiless_statuses() {
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(
            &b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 304 Not Modified\r\nContent-Length: 10\r\n\r\nHTTP/1.1 204 No Content\r\n\r\n"[..],
        );

        let statuses: Vec<_> =
            std::iter::from_fn(|| decoder.decode(&mut buf).unwrap()).map(|r| (r.status(), r.body().len())).collect();
        assert_eq!(
            statuses,
            vec![(StatusCode::CONTINUE, 0), (StatusCode::NOT_MODIFIED, 0), (StatusCode::NO_CONTENT, 0)]
        );
    }

    #[test]
    fn head_response_has_no_body() {
        let mut decoder = ResponseDecoder::new();
        decoder.set_head_response(true);
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\n"[..]);

        let response = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(response.body().is_empty());
        assert_eq!(response.headers().get_str("content-length"), Some("1024"));
        assert_eq!(response.content_length(), 1024);
    }

    #[test]
    fn not_modified_reports_declared_length() {
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(&b"HTTP/1.1 304 Not Modified\r\nContent-Length: 512\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok"[..]);

        let not_modified = decoder.decode(&mut buf).unwrap().unwrap();
        assert!(not_modified.body().is_empty());
        assert_eq!(not_modified.content_length(), 512);

        let ok = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(ok.content_length(), 2);
    }

    #[test]
    fn truncated_body_is_an_error() {
        let mut decoder = ResponseDecoder::new();
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort"[..]);
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        assert!(matches!(
            decoder.decode_eof(&mut buf),
            Err(ParseError::Protocol { source: ProtocolError::IncompleteMessage })
        ));
    }
}
