use bytes::Bytes;
use thiserror::Error;

use crate::http::buffer::{Accumulator, CapacityExceeded};
use crate::http::parser::{ParseError, ParseStatus, RequestParser};

/// HTTP request methods.
///
/// Only GET and PUT are served. Any other well-formed method token parses
/// and is answered with 405 Method Not Allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    PUT,
    Other(String),
}

impl Method {
    /// Maps a method token to a `Method`. Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use controller::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::GET);
    /// assert_eq!(Method::from_token("get"), Method::Other("get".into()));
    /// ```
    pub fn from_token(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "PUT" => Method::PUT,
            other => Method::Other(other.to_string()),
        }
    }
}

/// The parsed request line.
///
/// `target` and `path` are slices of the header block split off the
/// connection's accumulator, not copies.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    target: Bytes,
    path: Bytes,
    has_query: bool,
}

impl RequestHead {
    pub fn target(&self) -> &str {
        std::str::from_utf8(&self.target).unwrap_or_default()
    }

    /// The target without its query component.
    pub fn path(&self) -> &str {
        std::str::from_utf8(&self.path).unwrap_or_default()
    }

    pub fn has_query(&self) -> bool {
        self.has_query
    }
}

/// A fully assembled request.
#[derive(Debug, Clone)]
pub struct Request {
    pub head: RequestHead,
    pub body: Bytes,
}

impl Request {
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn path(&self) -> &str {
        self.head.path()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    NeedMore,
    Complete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The declared body needs a buffer past the accumulator's ceiling.
    #[error("request body too large: {0}")]
    BodyTooLarge(#[from] CapacityExceeded),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Headers,
    Body,
    Complete,
}

/// Turns the bytes collected in an `Accumulator` into a `Request`.
///
/// Headers are tokenized incrementally. Once they complete, the header block
/// is split off the accumulator and the accumulator is sized so that its
/// free space reaches zero exactly when the declared body has arrived.
#[derive(Debug)]
pub struct RequestAssembler {
    parser: RequestParser,
    phase: Phase,
    content_length: Option<usize>,
    head: Option<RequestHead>,
}

impl Default for RequestAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestAssembler {
    pub fn new() -> Self {
        Self {
            parser: RequestParser::new(),
            phase: Phase::Headers,
            content_length: None,
            head: None,
        }
    }

    /// The declared body length, once the `Content-Length` field was seen.
    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    pub fn head(&self) -> Option<&RequestHead> {
        self.head.as_ref()
    }

    /// Tokenizes whatever headers have arrived. `Complete` means the header
    /// block is done and the accumulator is sized for the body; ask
    /// `feed_body` whether the body is already there.
    pub fn feed_headers(&mut self, acc: &mut Accumulator) -> Result<Progress, AssembleError> {
        let content_length = &mut self.content_length;
        let status = self.parser.parse(acc.as_slice(), |name, value| {
            if name.eq_ignore_ascii_case("Content-Length") {
                if content_length.is_some() {
                    return Err(ParseError::DuplicateContentLength);
                }
                let value = std::str::from_utf8(value).map_err(|_| ParseError::InvalidContentLength)?;
                *content_length = Some(parse_content_length(value)?);
            }
            Ok(())
        })?;

        let ParseStatus::Complete { line, header_len } = status else {
            return Ok(Progress::NeedMore);
        };

        let block = acc.consume(header_len);
        let method = std::str::from_utf8(&block[line.method.clone()])
            .map_err(|_| ParseError::InvalidMethod)?;
        let path_end = line.query.unwrap_or(line.target.end);

        self.head = Some(RequestHead {
            method: Method::from_token(method),
            target: block.slice(line.target.clone()),
            path: block.slice(line.target.start..path_end),
            has_query: line.query.is_some(),
        });

        let declared = self.content_length.unwrap_or(0);
        let preread = acc.used();

        if preread >= declared {
            acc.truncate(declared);
            self.phase = Phase::Complete;
            return Ok(Progress::Complete);
        }

        if declared - preread > acc.remaining_free() {
            acc.grow_to(declared).map_err(AssembleError::BodyTooLarge)?;
        } else {
            acc.cap_at(declared);
        }

        self.phase = Phase::Body;
        Ok(Progress::Complete)
    }

    /// Reports `Complete` once the declared body length has been collected.
    pub fn feed_body(&mut self, acc: &Accumulator) -> Progress {
        if self.phase == Phase::Body && acc.remaining_free() == 0 {
            self.phase = Phase::Complete;
        }

        match self.phase {
            Phase::Complete => Progress::Complete,
            _ => Progress::NeedMore,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Hands out the assembled request. `None` until assembly is complete.
    pub fn finish(&mut self, acc: &mut Accumulator) -> Option<Request> {
        if !self.is_complete() {
            return None;
        }

        let head = self.head.take()?;
        Some(Request {
            head,
            body: acc.take(),
        })
    }
}

/// Parses a `Content-Length` value. Only positive base-10 integers are
/// accepted.
pub fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength);
    }

    match value.parse::<usize>() {
        Ok(0) | Err(_) => Err(ParseError::InvalidContentLength),
        Ok(n) => Ok(n),
    }
}
