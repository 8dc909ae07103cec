//! A parsed, immutable configuration document.

use serde_json::Value;

/// Document every controller starts from.
pub const BOOTSTRAP_DOCUMENT: &str = "{ \"sockets\": {}, \"applications\": {} }";

/// A JSON tree together with the generation it was installed as.
///
/// The tree is owned by the document and freed with it; nothing outside the
/// document points into it except through a shared `Arc<ConfigDocument>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Value,
    generation: u64,
}

impl ConfigDocument {
    /// Parses a candidate document. The result is staged: it carries
    /// generation 0 until a store installs it.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let root = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(root))
    }

    pub fn bootstrap() -> Result<Self, serde_json::Error> {
        Self::parse(BOOTSTRAP_DOCUMENT.as_bytes())
    }

    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            generation: 0,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Resolves a `/`-delimited path. Empty segments are skipped, so `/` and
    /// the empty path name the whole document. Array elements are addressed
    /// by decimal index.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        self.root.pointer(&json_pointer(path))
    }
}

/// Converts a request path into a JSON pointer, e.g. `/a//b~c/` into
/// `/a/b~0c`.
pub fn json_pointer(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .fold(String::with_capacity(path.len()), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment.replace('~', "~0"));
            pointer
        })
}
