//! Error types for the index crate.

use mindly_types::NodeId;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// No node has the given identifier or name path.
    #[error("no such node: {0}")]
    NoSuchNode(String),

    /// More than one node has the given name path.
    #[error("ambiguous name path {path:?}: matches {matches:?}")]
    AmbiguousPath {
        path: Vec<String>,
        matches: Vec<NodeId>,
    },

    /// The same identifier appeared twice in the loaded data.
    #[error("duplicate node identifier: {0}")]
    DuplicateNode(NodeId),

    /// The indices disagree with each other.
    #[error("index inconsistent: {}", .0.join("; "))]
    Inconsistent(Vec<String>),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
