use std::path::PathBuf;

use mindly_codec::CodecError;
use mindly_index::IndexError;
use mindly_types::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a file in the data directory failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be decoded or encoded, including unsupported
    /// format versions.
    #[error("{filename}: {source}")]
    Codec {
        filename: String,
        #[source]
        source: CodecError,
    },

    /// Lookup or consistency failure in the tree index.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// No payload is loaded under this filename.
    #[error("no loaded file named {0}")]
    UnknownFile(String),

    /// The parent cannot hold the requested kind of node.
    #[error("{id} (depth {depth}) cannot be the parent of a new {kind}")]
    InvalidParent {
        id: NodeId,
        depth: usize,
        kind: &'static str,
    },

    /// Some dirty files could not be written; they remain dirty.
    #[error("write-back failed for {} file(s): {}", failures.len(), summarize(failures))]
    WriteBack { failures: Vec<WriteFailure> },
}

/// One file that failed during write-back.
#[derive(Debug)]
pub struct WriteFailure {
    pub filename: String,
    pub error: StoreError,
}

fn summarize(failures: &[WriteFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.filename, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

impl StoreError {
    /// Shorthand for a missing node.
    pub fn no_such_node(id: impl ToString) -> Self {
        Self::Index(IndexError::NoSuchNode(id.to_string()))
    }

    /// `true` when the error is an unsupported `fileFormatVersion`.
    pub fn is_format_version(&self) -> bool {
        matches!(
            self,
            Self::Codec {
                source: CodecError::FormatVersion { .. },
                ..
            }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
