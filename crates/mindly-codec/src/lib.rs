//! File codecs for Mindly data.
//!
//! Two file kinds exist on disk:
//!
//! - **Index** (`mindly.index`): plain UTF-8 JSON, `fileFormatVersion` 2
//! - **Document** (`*.mndl`): zlib-compressed UTF-8 JSON wrapping the payload
//!   in an `ideaDocumentDataObject` envelope, `fileFormatVersion` 4
//!
//! Decoding always checks the declared format version before the payload is
//! interpreted, so an unsupported file never yields a partially typed value.

pub mod codec;
pub mod error;
pub mod version;

pub use codec::{MindlyCodec, ENVELOPE_KEY};
pub use error::{CodecError, CodecResult};
pub use version::{check_version, FileKind, VERSION_KEY};
