//! Per-connection request/response state machine.
//!
//! The machine performs no I/O. The driver in `connection` feeds it events
//! (bytes received, bytes sent, deadline passed, ...) and performs the
//! action it asks for next. Deadlines are tracked here so the phase timeout
//! rules can be exercised without a socket.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::http::buffer::{Accumulator, DEFAULT_MAX_CAPACITY};
use crate::http::parser::ParseError;
use crate::http::request::{AssembleError, Method, Progress, Request, RequestAssembler};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::{ResponseError, ResponseWriter};
use crate::store::{ConfigDocument, ConfigStore};

/// Per-connection limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Size of the initial read buffer; headers must fit in it.
    pub read_buffer_size: usize,
    /// The read buffer never grows past this. A request whose body would need
    /// more is dropped without a response.
    pub max_buffer_size: usize,
    /// Measured from the start of the header phase, never extended.
    pub header_timeout: Duration,
    /// Restarted after every read that delivers body bytes.
    pub body_timeout: Duration,
    /// Restarted after every write that the socket accepts.
    pub write_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            read_buffer_size: 1024,
            max_buffer_size: DEFAULT_MAX_CAPACITY,
            header_timeout: Duration::from_secs(60),
            body_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Init,
    ReadingHeaders,
    ReadingBody,
    Processing,
    Writing,
    Closing,
    Freed,
}

#[derive(Debug)]
pub enum Event<'a> {
    /// The connection was accepted.
    Start,
    Received(&'a [u8]),
    /// The peer closed its side before the request was complete.
    PeerClosed,
    ReadFailed,
    Sent(usize),
    WriteFailed,
    /// The current phase deadline passed.
    TimedOut,
    ShutdownComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read at most `max` bytes, then report `Received` or an error event.
    Read { max: usize },
    /// Write `pending_output()`, then report `Sent` or `WriteFailed`.
    Write,
    /// Shut the socket down, then report `ShutdownComplete`.
    Shutdown,
    /// Nothing left to do; drop the connection.
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The response was fully written.
    Completed,
    PeerClosed,
    Transport,
    Parse(ParseError),
    HeadersTooLong,
    BodyTooLarge,
    TimedOut,
    ResponseFailed,
}

pub struct StateMachine {
    state: ConnectionState,
    settings: Settings,
    store: Arc<ConfigStore>,
    acc: Accumulator,
    assembler: RequestAssembler,
    writer: Option<ResponseWriter>,
    status: Option<StatusCode>,
    deadline: Option<Instant>,
    close_reason: Option<CloseReason>,
    timed_out: bool,
}

impl StateMachine {
    pub fn new(store: Arc<ConfigStore>, settings: Settings) -> Self {
        Self {
            state: ConnectionState::Init,
            acc: Accumulator::with_max_capacity(settings.read_buffer_size, settings.max_buffer_size),
            assembler: RequestAssembler::new(),
            writer: None,
            status: None,
            deadline: None,
            close_reason: None,
            timed_out: false,
            settings,
            store,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// When the current phase times out, if it has a timeout.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn close_reason(&self) -> Option<&CloseReason> {
        self.close_reason.as_ref()
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Status of the response being written, once one was built.
    pub fn response_status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn pending_output(&self) -> &[u8] {
        self.writer.as_ref().map(ResponseWriter::pending).unwrap_or_default()
    }

    pub fn handle(&mut self, event: Event<'_>, now: Instant) -> Action {
        use ConnectionState::*;

        match (self.state, event) {
            (Init, Event::Start) => {
                self.state = ReadingHeaders;
                self.deadline = Some(now + self.settings.header_timeout);
                self.read()
            }

            (ReadingHeaders, Event::Received(data)) => {
                if let Err(e) = self.acc.append(data) {
                    warn!(error = %e, "read overran header buffer");
                    return self.close(CloseReason::HeadersTooLong);
                }
                self.on_header_bytes(now)
            }

            (ReadingBody, Event::Received(data)) => {
                if let Err(e) = self.acc.append(data) {
                    warn!(error = %e, "read overran body buffer");
                    return self.close(CloseReason::Transport);
                }
                self.deadline = Some(now + self.settings.body_timeout);

                match self.assembler.feed_body(&self.acc) {
                    Progress::Complete => {
                        debug!("request body read complete");
                        self.process(now)
                    }
                    Progress::NeedMore => {
                        debug!(rest = self.acc.remaining_free(), "request body read again");
                        self.read()
                    }
                }
            }

            (ReadingHeaders | ReadingBody, Event::PeerClosed) => {
                debug!("peer closed connection before request was complete");
                self.close(CloseReason::PeerClosed)
            }

            (ReadingHeaders | ReadingBody, Event::ReadFailed) => {
                debug!("read error");
                self.close(CloseReason::Transport)
            }

            (Writing, Event::Sent(n)) => {
                let Some(writer) = self.writer.as_mut() else {
                    return self.close(CloseReason::ResponseFailed);
                };
                writer.advance(n);

                if writer.is_flushed() {
                    debug!("response write complete");
                    return self.close(CloseReason::Completed);
                }

                self.deadline = Some(now + self.settings.write_timeout);
                Action::Write
            }

            (Writing, Event::WriteFailed) => {
                debug!("write error");
                self.close(CloseReason::Transport)
            }

            (ReadingHeaders | ReadingBody | Writing, Event::TimedOut) => {
                debug!(state = ?self.state, "connection timed out");
                self.timed_out = true;
                self.close(CloseReason::TimedOut)
            }

            (Closing, Event::ShutdownComplete) => {
                self.free();
                Action::Free
            }

            (state, event) => {
                debug!(?state, ?event, "ignoring event");
                self.next_action()
            }
        }
    }

    fn on_header_bytes(&mut self, now: Instant) -> Action {
        match self.assembler.feed_headers(&mut self.acc) {
            Err(AssembleError::Parse(e)) => {
                error!(error = %e, "parsing error");
                self.close(CloseReason::Parse(e))
            }

            Err(AssembleError::BodyTooLarge(e)) => {
                error!(declared = e.requested, limit = e.free, "request body too large");
                self.close(CloseReason::BodyTooLarge)
            }

            Ok(Progress::NeedMore) => {
                if self.acc.remaining_free() == 0 {
                    error!("too long request headers");
                    return self.close(CloseReason::HeadersTooLong);
                }
                self.read()
            }

            Ok(Progress::Complete) => {
                debug!(
                    body_length = self.assembler.content_length().unwrap_or(0),
                    preread = self.acc.used(),
                    "request header parsing complete"
                );

                match self.assembler.feed_body(&self.acc) {
                    Progress::Complete => self.process(now),
                    Progress::NeedMore => {
                        self.state = ConnectionState::ReadingBody;
                        self.deadline = Some(now + self.settings.body_timeout);
                        self.read()
                    }
                }
            }
        }
    }

    fn process(&mut self, now: Instant) -> Action {
        self.state = ConnectionState::Processing;
        self.deadline = None;

        let Some(request) = self.assembler.finish(&mut self.acc) else {
            error!("request processed before assembly completed");
            return self.close(CloseReason::ResponseFailed);
        };

        match self.handle_request(&request) {
            Ok((status, writer)) => {
                debug!(
                    method = ?request.method(),
                    path = %request.path(),
                    status = status.as_u16(),
                    "request processed"
                );
                self.status = Some(status);
                self.writer = Some(writer);
                self.state = ConnectionState::Writing;
                self.deadline = Some(now + self.settings.write_timeout);
                Action::Write
            }
            Err(e) => {
                error!(error = %e, "failed to build response");
                self.close(CloseReason::ResponseFailed)
            }
        }
    }

    /// Runs one request against the store. Never suspends: a GET renders
    /// from the snapshot it resolved before any later replace can matter.
    fn handle_request(
        &self,
        request: &Request,
    ) -> Result<(StatusCode, ResponseWriter), ResponseError> {
        match request.method() {
            Method::GET => {
                let snapshot = self.store.current();
                match snapshot.lookup(request.path()) {
                    Some(found) => respond(&Response::ok(found)),
                    None => respond(&Response::not_found()),
                }
            }

            Method::PUT => match ConfigDocument::parse(&request.body) {
                Ok(staged) => {
                    self.store.replace(staged);
                    respond(&Response::created())
                }
                Err(e) => {
                    warn!(error = %e, "rejected configuration update: invalid JSON");
                    respond(&Response::bad_request())
                }
            },

            _ => respond(&Response::method_not_allowed()),
        }
    }

    fn read(&self) -> Action {
        Action::Read {
            max: self.acc.remaining_free(),
        }
    }

    fn close(&mut self, reason: CloseReason) -> Action {
        debug!(?reason, "connection close");
        self.state = ConnectionState::Closing;
        self.deadline = None;
        self.close_reason = Some(reason);
        Action::Shutdown
    }

    fn free(&mut self) {
        debug!("connection free");
        self.state = ConnectionState::Freed;
        self.acc = Accumulator::new(0);
        self.assembler = RequestAssembler::new();
        self.writer = None;
    }

    fn next_action(&self) -> Action {
        match self.state {
            ConnectionState::Init | ConnectionState::ReadingHeaders | ConnectionState::ReadingBody => {
                self.read()
            }
            ConnectionState::Processing | ConnectionState::Closing => Action::Shutdown,
            ConnectionState::Writing => Action::Write,
            ConnectionState::Freed => Action::Free,
        }
    }
}

fn respond(response: &Response<'_>) -> Result<(StatusCode, ResponseWriter), ResponseError> {
    ResponseWriter::from_response(response).map(|writer| (response.status, writer))
}
