use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;

use crate::http::response::{BodySource, Response};

const HTTP_VERSION: &str = "HTTP/1.0";
const INDENT: &[u8] = b"    ";

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response literal is not valid JSON: {0}")]
    MalformedLiteral(#[source] serde_json::Error),
    #[error("failed to render response body: {0}")]
    Render(#[source] serde_json::Error),
}

/// Counts bytes instead of storing them.
#[derive(Default)]
struct ByteCounter(usize);

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn print_json<W: Write>(out: W, value: &Value) -> Result<(), ResponseError> {
    let mut ser = Serializer::with_formatter(out, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser).map_err(ResponseError::Render)
}

/// Renders `HTTP/1.0 <status>\r\n\r\n<pretty JSON>\r\n`.
///
/// The body is printed twice: once into a counter to size the buffer, once
/// into the exact-size buffer.
pub fn serialize_response(resp: &Response<'_>) -> Result<Vec<u8>, ResponseError> {
    let literal;
    let value = match resp.body {
        BodySource::Value(value) => value,
        BodySource::Literal(text) => {
            literal = serde_json::from_str::<Value>(text).map_err(ResponseError::MalformedLiteral)?;
            &literal
        }
    };

    let status_line = resp.status.status_line();

    let mut counter = ByteCounter::default();
    print_json(&mut counter, value)?;

    let size = HTTP_VERSION.len() + 1 + status_line.len() + 4 + counter.0 + 2;
    let mut buf = Vec::with_capacity(size);

    buf.extend_from_slice(HTTP_VERSION.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(status_line.as_bytes());
    buf.extend_from_slice(b"\r\n\r\n");
    print_json(&mut buf, value)?;
    buf.extend_from_slice(b"\r\n");

    Ok(buf)
}

/// Outgoing bytes plus a cursor of how many the socket has taken.
#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer, written: 0 }
    }

    pub fn from_response(response: &Response<'_>) -> Result<Self, ResponseError> {
        serialize_response(response).map(Self::new)
    }

    /// Bytes not yet accepted by the socket.
    pub fn pending(&self) -> &[u8] {
        &self.buffer[self.written..]
    }

    pub fn advance(&mut self, n: usize) {
        self.written = (self.written + n).min(self.buffer.len());
    }

    pub fn is_flushed(&self) -> bool {
        self.written == self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
