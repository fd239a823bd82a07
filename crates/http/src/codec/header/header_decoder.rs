//! Header line parsing and body framing.
//!
//! Each header line is validated on its own as it arrives. Once the empty
//! line ending the block is seen, [`payload_size`] inspects `Content-Length`
//! and `Transfer-Encoding` to decide how the body is delimited, following
//! RFC 9112 section 6.3.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderName, HeaderValue};
use tracing::trace;

use crate::codec::limits::{DecoderLimits, FramingConflict};
use crate::codec::message_decoder::MessageKind;
use crate::ensure;
use crate::protocol::{Headers, ParseError, PayloadSize, ProtocolError};

/// Parses one `name: value` line, terminator already stripped.
///
/// Obsolete line folding (a line starting with whitespace) is rejected, as is
/// whitespace between the name and the colon.
pub(crate) fn parse_header_line(line: &Bytes) -> Result<(HeaderName, HeaderValue), ProtocolError> {
    if matches!(line.first(), Some(b' ' | b'\t')) {
        return Err(ProtocolError::invalid_header("obsolete line folding"));
    }

    let colon = line
        .iter()
        .position(|b| *b == b':')
        .ok_or_else(|| ProtocolError::invalid_header(format!("missing colon in {:?}", String::from_utf8_lossy(line))))?;

    let name = HeaderName::from_bytes(&line[..colon])
        .map_err(|_| ProtocolError::invalid_header(format!("invalid name {:?}", String::from_utf8_lossy(&line[..colon]))))?;

    let raw = &line[colon + 1..];
    let start = raw.iter().position(|b| !is_ows(*b)).unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !is_ows(*b)).map_or(start, |i| i + 1);
    let value = HeaderValue::from_maybe_shared(line.slice(colon + 1 + start..colon + 1 + end))
        .map_err(|_| ProtocolError::invalid_header(format!("invalid value for {name}")))?;

    Ok((name, value))
}

#[inline]
fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Decides how the body following `headers` is framed.
///
/// `body_forbidden` covers responses that never carry a body: 1xx, 204, 304
/// and anything answering a HEAD request.
pub(crate) fn payload_size(
    headers: &Headers,
    kind: MessageKind,
    body_forbidden: bool,
    limits: &DecoderLimits,
) -> Result<PayloadSize, ParseError> {
    if body_forbidden {
        return Ok(PayloadSize::Empty);
    }

    let has_te = headers.contains(TRANSFER_ENCODING);
    let content_length = content_length(headers)?;

    let payload_size = match (has_te, content_length) {
        (true, content_length) => {
            if is_chunked(headers) {
                ensure!(
                    content_length.is_none() || limits.framing_conflict == FramingConflict::PreferChunked,
                    ProtocolError::AmbiguousFraming.into()
                );
                PayloadSize::Chunked
            } else {
                match kind {
                    MessageKind::Request => {
                        let coding = headers.get_all(TRANSFER_ENCODING).last().map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
                        return Err(ProtocolError::UnsupportedTransferEncoding { coding: coding.unwrap_or_default() }.into());
                    }
                    // a response may end its body by closing the connection
                    MessageKind::Response => PayloadSize::UntilClose,
                }
            }
        }

        (false, Some(length)) => {
            ensure!(length <= limits.max_body_size, ParseError::too_large_body(length, limits.max_body_size));
            PayloadSize::new_length(length)
        }

        (false, None) => match kind {
            MessageKind::Request => PayloadSize::Empty,
            MessageKind::Response => PayloadSize::UntilClose,
        },
    };

    trace!(?payload_size, "decided body framing");
    Ok(payload_size)
}

/// Parses every `Content-Length` value. Repeated values must agree.
fn content_length(headers: &Headers) -> Result<Option<u64>, ProtocolError> {
    let mut length = None;

    for value in headers.get_all(CONTENT_LENGTH) {
        for item in value.as_bytes().split(|b| *b == b',') {
            let item = item.trim_ascii();
            if item.is_empty() || !item.iter().all(u8::is_ascii_digit) {
                return Err(ProtocolError::invalid_content_length(format!(
                    "value {:?} is not a number",
                    String::from_utf8_lossy(item)
                )));
            }

            let parsed = std::str::from_utf8(item)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| ProtocolError::invalid_content_length("value overflows u64"))?;

            match length {
                Some(existing) if existing != parsed => {
                    return Err(ProtocolError::invalid_content_length(format!("conflicting values {existing} and {parsed}")));
                }
                _ => length = Some(parsed),
            }
        }
    }

    Ok(length)
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 9112, chunked must be the last coding applied, so only
/// the final token of the final field counts.
fn is_chunked(headers: &Headers) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    headers
        .get_all(TRANSFER_ENCODING)
        .last()
        .and_then(|value| value.as_bytes().rsplit(|b| *b == b',').next())
        .is_some_and(|coding| coding.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}
