use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Instant, timeout_at};

use crate::http::state::{Action, CloseReason, Event, Settings, StateMachine};
use crate::store::ConfigStore;

/// Upper bound for a single read from the socket.
const READ_CHUNK: usize = 4096;

static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifies a connection in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Drives a `StateMachine` over a tokio socket.
pub struct Connection {
    stream: TcpStream,
    machine: StateMachine,
}

impl Connection {
    pub fn new(stream: TcpStream, store: Arc<ConfigStore>, settings: Settings) -> Self {
        Self {
            stream,
            machine: StateMachine::new(store, settings),
        }
    }

    /// Runs the connection to completion and reports why it closed.
    pub async fn run(&mut self) -> CloseReason {
        let mut chunk = [0u8; READ_CHUNK];
        let mut action = self.machine.handle(Event::Start, Instant::now());

        loop {
            action = match action {
                Action::Read { max } => {
                    let max = max.min(READ_CHUNK);
                    let read = self.stream.read(&mut chunk[..max]);
                    let result = match self.machine.deadline() {
                        Some(deadline) => timeout_at(deadline, read).await,
                        None => Ok(read.await),
                    };

                    let event = match result {
                        Err(_) => Event::TimedOut,
                        Ok(Ok(0)) => Event::PeerClosed,
                        Ok(Ok(n)) => Event::Received(&chunk[..n]),
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, "read failed");
                            Event::ReadFailed
                        }
                    };
                    self.machine.handle(event, Instant::now())
                }

                Action::Write => {
                    let write = self.stream.write(self.machine.pending_output());
                    let result = match self.machine.deadline() {
                        Some(deadline) => timeout_at(deadline, write).await,
                        None => Ok(write.await),
                    };

                    let event = match result {
                        Err(_) => Event::TimedOut,
                        Ok(Ok(0)) => Event::WriteFailed,
                        Ok(Ok(n)) => Event::Sent(n),
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, "write failed");
                            Event::WriteFailed
                        }
                    };
                    self.machine.handle(event, Instant::now())
                }

                Action::Shutdown => {
                    if let Err(e) = self.stream.shutdown().await {
                        tracing::trace!(error = %e, "socket shutdown failed");
                    }
                    self.machine.handle(Event::ShutdownComplete, Instant::now())
                }

                Action::Free => break,
            };
        }

        self.machine
            .close_reason()
            .cloned()
            .unwrap_or(CloseReason::Completed)
    }
}
