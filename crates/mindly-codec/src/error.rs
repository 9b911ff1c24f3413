use serde_json::Value;
use thiserror::Error;

use crate::version::FileKind;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The file declares a `fileFormatVersion` this crate cannot read.
    #[error("{kind} version {found} not supported (supported versions: [{supported}])")]
    FormatVersion {
        kind: FileKind,
        found: Value,
        supported: u32,
    },

    /// The decompressed document has no `ideaDocumentDataObject` object.
    #[error("document has no {key:?} envelope object")]
    MissingEnvelope { key: &'static str },

    /// Malformed JSON, or JSON that does not fit the payload model.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// zlib compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;
