use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid request line")]
    InvalidRequest,
    #[error("invalid method token")]
    InvalidMethod,
    #[error("invalid request target")]
    InvalidTarget,
    #[error("unsupported protocol version")]
    InvalidVersion,
    #[error("invalid header field")]
    InvalidHeader,
    #[error("invalid Content-Length value")]
    InvalidContentLength,
    #[error("duplicate Content-Length header")]
    DuplicateContentLength,
}

/// Offsets of the request line components inside the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Range<usize>,
    pub target: Range<usize>,
    /// Offset of the `?` that starts the query, if any.
    pub query: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    /// The header block is not terminated yet; append more bytes and call
    /// `parse` again with the whole buffer.
    Partial,
    /// The header block ends `header_len` bytes into the buffer. Every header
    /// field has been passed to the callback.
    Complete { line: RequestLine, header_len: usize },
}

/// Incremental request-line and header tokenizer.
///
/// The parser keeps only scan offsets between calls, so it must be fed the
/// same buffer (with new bytes appended) until it reports completion.
#[derive(Debug, Default)]
pub struct RequestParser {
    line: Option<(RequestLine, usize)>,
    scanned: usize,
}

impl RequestParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<F>(&mut self, buf: &[u8], mut on_field: F) -> Result<ParseStatus, ParseError>
    where
        F: FnMut(&str, &[u8]) -> Result<(), ParseError>,
    {
        let (line, line_end) = if let Some(parsed) = self.line.clone() {
            parsed
        } else {
            let Some(line_end) = find_crlf(buf, self.scanned) else {
                self.scanned = buf.len().saturating_sub(1);
                return Ok(ParseStatus::Partial);
            };

            // Rejected as soon as the line is in, without waiting for the
            // rest of the header block.
            let line = parse_request_line(&buf[..line_end])?;
            self.line = Some((line.clone(), line_end));
            self.scanned = line_end;
            (line, line_end)
        };

        // The request line's own CRLF may be the first half of the terminator.
        let Some(headers_end) = find_headers_end(buf, self.scanned.max(line_end)) else {
            self.scanned = buf.len().saturating_sub(3).max(line_end);
            return Ok(ParseStatus::Partial);
        };

        if headers_end > line_end {
            let fields = &buf[line_end + 2..headers_end];
            for raw in fields.split_inclusive(|&b| b == b'\n') {
                let raw = raw.strip_suffix(b"\r\n").unwrap_or(raw);
                let (name, value) = parse_header_field(raw)?;
                on_field(name, value)?;
            }
        }

        Ok(ParseStatus::Complete {
            line,
            header_len: headers_end + 4,
        })
    }
}

fn parse_request_line(line: &[u8]) -> Result<RequestLine, ParseError> {
    let method_end = line
        .iter()
        .position(|&b| b == b' ')
        .ok_or(ParseError::InvalidRequest)?;

    let target_start = method_end + 1;
    let target_end = line[target_start..]
        .iter()
        .position(|&b| b == b' ')
        .map(|n| target_start + n)
        .ok_or(ParseError::InvalidRequest)?;

    let method = &line[..method_end];
    if method.is_empty() || !method.iter().all(|&b| is_token_char(b)) {
        return Err(ParseError::InvalidMethod);
    }

    let target = &line[target_start..target_end];
    if target.first() != Some(&b'/') || !target.iter().all(|&b| b.is_ascii_graphic()) {
        return Err(ParseError::InvalidTarget);
    }

    let version = &line[target_end + 1..];
    match version {
        b"HTTP/1.0" | b"HTTP/1.1" => {}
        _ => return Err(ParseError::InvalidVersion),
    }

    let query = target
        .iter()
        .position(|&b| b == b'?')
        .map(|n| target_start + n);

    Ok(RequestLine {
        method: 0..method_end,
        target: target_start..target_end,
        query,
    })
}

/// Splits a field into its name and raw value. Values may carry obs-text
/// (bytes 0x80-0xFF), so they stay bytes; callers decode what they need.
fn parse_header_field(raw: &[u8]) -> Result<(&str, &[u8]), ParseError> {
    let colon = raw
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParseError::InvalidHeader)?;

    let name = &raw[..colon];
    if name.is_empty() || !name.iter().all(|&b| is_token_char(b)) {
        return Err(ParseError::InvalidHeader);
    }

    let value = &raw[colon + 1..];
    if value.iter().any(|&b| b == b'\r' || b == b'\n') {
        return Err(ParseError::InvalidHeader);
    }

    // Token characters are ASCII, so the name is valid UTF-8.
    let name = std::str::from_utf8(name).map_err(|_| ParseError::InvalidHeader)?;

    Ok((name, trim_whitespace(value)))
}

fn trim_whitespace(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|n| from + n)
}

fn find_headers_end(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|n| from + n)
}
