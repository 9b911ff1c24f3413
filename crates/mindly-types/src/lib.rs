//! Foundation types for Mindly mind-map data.
//!
//! Mindly keeps its data in one plain-JSON index file and one compressed
//! JSON file per document. This crate provides the identifier and record
//! types shared by every other crate in the workspace.
//!
//! # Key Types
//!
//! - [`NodeId`] -- textual node identifier, including the virtual root marker
//! - [`IndexPayload`] -- contents of `mindly.index` (sections and proxies)
//! - [`DocumentPayload`] -- contents of a `.mndl` document file
//! - [`IdeaRecord`] -- one node of a document's nested idea tree

pub mod error;
pub mod id;
pub mod record;
pub mod timestamp;

pub use error::TypeError;
pub use id::{generate_id, NodeId, ROOT_ID};
pub use record::{
    DocumentPayload, IdeaRecord, IndexPayload, ProxyRecord, SectionRecord, DEFAULT_COLOR,
    DEFAULT_COLOR_THEME_TYPE, DEFAULT_IDEA_TYPE, DOCUMENT_EXTENSION, DOCUMENT_FORMAT_VERSION,
    INDEX_FILENAME, INDEX_FORMAT_VERSION,
};
pub use timestamp::{format_timestamp, now_timestamp};
