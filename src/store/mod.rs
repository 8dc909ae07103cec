//! Configuration document storage.
//!
//! This module holds the document the control API reads and replaces.
//! A document is immutable once built; a PUT builds a new one and swaps it in.

pub mod document;
pub mod config_store;

pub use config_store::{ConfigStore, ValueRef};
pub use document::ConfigDocument;
