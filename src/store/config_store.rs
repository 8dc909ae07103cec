//! The current configuration document and its atomic replacement.
//!
//! Readers load an `Arc` snapshot of whatever document is current and keep
//! it for as long as they render from it. `replace` swaps the pointer; the
//! retired document is dropped once its last snapshot goes away. A reader
//! therefore always sees one whole document, old or new, never a mix, on any
//! number of worker threads. Writers are serialized by a lock that readers
//! never take.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::store::document::{ConfigDocument, json_pointer};

#[derive(Debug)]
pub struct ConfigStore {
    current: ArcSwap<ConfigDocument>,
    writer: Mutex<()>,
}

/// A path resolved against one document snapshot.
///
/// Holding a `ValueRef` keeps that snapshot alive across later replaces.
#[derive(Debug, Clone)]
pub struct ValueRef {
    document: Arc<ConfigDocument>,
    pointer: String,
}

impl ValueRef {
    /// The resolved value. `None` only if the pointer no longer matches,
    /// which an immutable snapshot rules out.
    pub fn value(&self) -> Option<&Value> {
        self.document.root().pointer(&self.pointer)
    }

    /// JSON pointer of the value inside its document.
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn document(&self) -> &Arc<ConfigDocument> {
        &self.document
    }
}

impl ConfigStore {
    /// Creates a store holding `document` as generation 1.
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            current: ArcSwap::from_pointee(document.with_generation(1)),
            writer: Mutex::new(()),
        }
    }

    /// Creates a store holding the bootstrap document.
    pub fn bootstrap() -> Result<Self, serde_json::Error> {
        Ok(Self::new(ConfigDocument::bootstrap()?))
    }

    /// Snapshot of the whole current document. Paths resolved against the
    /// snapshot stay valid across later replaces for as long as it is held.
    pub fn current(&self) -> Arc<ConfigDocument> {
        self.current.load_full()
    }

    /// Resolves `path` against the current snapshot.
    pub fn lookup(&self, path: &str) -> Option<ValueRef> {
        let document = self.current();
        let pointer = json_pointer(path);
        document.root().pointer(&pointer)?;

        Some(ValueRef { document, pointer })
    }

    /// Installs `candidate` as the current document and returns the
    /// generation it was assigned.
    pub fn replace(&self, candidate: ConfigDocument) -> u64 {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let generation = self.current.load().generation() + 1;
        let previous = self
            .current
            .swap(Arc::new(candidate.with_generation(generation)));

        tracing::info!(
            generation,
            previous = previous.generation(),
            "Configuration replaced"
        );

        generation
    }
}
