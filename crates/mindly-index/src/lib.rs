//! Tree indexing for Mindly data.
//!
//! Derives the node forest and its lookup indices from decoded payloads.
//! Nothing here touches the filesystem; the store crate feeds decoded
//! payloads in and keeps the indices in step with every mutation.
//!
//! # Key Types
//!
//! - [`TreeIndex`] -- the forest plus ancestry, structure, and filename indices
//! - [`TreeFragment`] -- nodes and child lists derived from one payload
//! - [`NodeSlot`] -- where a node's record lives inside its payload
//!
//! # Indices
//!
//! - **ancestry by id**: identifiers from the virtual root down to the node
//! - **ancestry by name**: the same lineage as display texts
//! - **structure**: each node's ordered direct children
//! - **filename by id**: the file that materially owns each node
//! - **proxy filenames**: document filenames in index proxy order

pub mod error;
pub mod index;
pub mod indexer;

pub use error::{IndexError, IndexResult};
pub use index::TreeIndex;
pub use indexer::{extract_document_tree, index_sections, IndexedNode, NodeSlot, TreeFragment};
