//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.0 server: one request per connection, no
//! chunked bodies, the connection is closed after the response.
//!
//! # Architecture
//!
//! - **`buffer`**: The per-connection receive buffer
//! - **`parser`**: Incremental request-line and header tokenizer
//! - **`request`**: Request representation and the request assembler
//! - **`response`**: Status codes and response bodies
//! - **`writer`**: Serializes responses and tracks how much was written
//! - **`state`**: The request/response state machine (no I/O)
//! - **`connection`**: Drives the state machine over a tokio socket
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │  ReadingHeaders  │ ← 60s from entry, not extended
//!        └──────┬───────────┘
//!               │ headers complete, body pending
//!               ▼
//!        ┌──────────────────┐
//!        │   ReadingBody    │ ← 60s, restarted by every read
//!        └──────┬───────────┘
//!               │ Content-Length bytes collected
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← GET / PUT against the store
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← 60s, restarted by every write
//!        └──────┬───────────┘
//!               │ flushed, failed, or timed out
//!               ▼
//!        ┌──────────────────┐
//!        │ Closing → Freed  │
//!        └──────────────────┘
//! ```
//!
//! Parse errors, oversized headers, transport errors and timeouts skip
//! straight to Closing without a response.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use controller::http::connection::Connection;
//! use controller::http::state::Settings;
//! use controller::store::ConfigStore;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(ConfigStore::bootstrap()?);
//!     let listener = TcpListener::bind("127.0.0.1:8443").await?;
//!
//!     loop {
//!         let (socket, _) = listener.accept().await?;
//!         let store = store.clone();
//!         tokio::spawn(async move {
//!             let reason = Connection::new(socket, store, Settings::default()).run().await;
//!             eprintln!("closed: {:?}", reason);
//!         });
//!     }
//! }
//! ```

pub mod buffer;
pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod state;
pub mod writer;
