//! Controller - configuration control endpoint
//!
//! Serves the runtime's JSON configuration document over HTTP: GET reads a
//! subtree by path, PUT replaces the whole document.

pub mod config;
pub mod http;
pub mod server;
pub mod store;
