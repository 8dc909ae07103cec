//! Listening socket and connection dispatch.

pub mod listener;
