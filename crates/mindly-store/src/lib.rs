//! Store for a Mindly data directory.
//!
//! [`Store`] is the single entry point for reading and changing Mindly data.
//! It owns the decoded index and document payloads, the node forest with its
//! indices, and the set of files changed since the last write.
//!
//! # Lifecycle
//!
//! 1. [`Store::open`] decodes `mindly.index` and every document it lists,
//!    rejecting unsupported format versions before anything is indexed.
//! 2. [`Store::create_node`] adds a section, document, or idea depending on
//!    the parent's depth, updating payloads and indices together and marking
//!    the touched files dirty (a document change always dirties the index).
//! 3. [`Store::write`] encodes and writes every dirty file, clearing each
//!    entry once its file is on disk.

pub mod error;
pub mod factory;
pub mod store;
pub mod writeback;

#[cfg(test)]
mod fixtures;

pub use error::{StoreError, StoreResult, WriteFailure};
pub use factory::{CreatedNode, NodeOptions};
pub use store::{NodeRef, Store};

pub use mindly_index::{IndexError, TreeIndex};
pub use mindly_types::{NodeId, INDEX_FILENAME};
