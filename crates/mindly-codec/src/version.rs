use std::fmt;

use mindly_types::{DOCUMENT_FORMAT_VERSION, INDEX_FORMAT_VERSION};
use serde_json::Value;

use crate::error::{CodecError, CodecResult};

/// The two kinds of file in a Mindly data directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Index,
    Document,
}

impl FileKind {
    /// The single `fileFormatVersion` supported for this kind.
    pub fn supported_version(self) -> u32 {
        match self {
            Self::Index => INDEX_FORMAT_VERSION,
            Self::Document => DOCUMENT_FORMAT_VERSION,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index => f.write_str("index"),
            Self::Document => f.write_str("document"),
        }
    }
}

/// Field holding a payload's format version.
pub const VERSION_KEY: &str = "fileFormatVersion";

/// Reject a decoded payload whose `fileFormatVersion` is not the one
/// supported for `kind`. Numbers compare by value, so `2.0` equals `2`.
/// A missing or non-numeric version is rejected.
pub fn check_version(kind: FileKind, payload: &Value) -> CodecResult<()> {
    let found = payload.get(VERSION_KEY).cloned().unwrap_or(Value::Null);
    let supported = kind.supported_version();
    if found.as_f64() == Some(f64::from(supported)) {
        return Ok(());
    }
    Err(CodecError::FormatVersion {
        kind,
        found,
        supported,
    })
}
