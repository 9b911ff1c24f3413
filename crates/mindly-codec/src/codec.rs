use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use mindly_types::{DocumentPayload, IndexPayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{CodecError, CodecResult};
use crate::version::{check_version, FileKind, VERSION_KEY};

/// Key wrapping the payload inside a decompressed document file.
pub const ENVELOPE_KEY: &str = "ideaDocumentDataObject";

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "ideaDocumentDataObject")]
    payload: &'a DocumentPayload,
}

/// Encoder/decoder for both Mindly file kinds.
pub struct MindlyCodec;

impl MindlyCodec {
    /// Decode `mindly.index` bytes: plain JSON, version-checked.
    pub fn decode_index(bytes: &[u8]) -> CodecResult<IndexPayload> {
        let value = parse_json(bytes)?;
        typed(FileKind::Index, value)
    }

    /// Encode the index as compact JSON.
    pub fn encode_index(payload: &IndexPayload) -> CodecResult<Vec<u8>> {
        Ok(serde_json::to_vec(payload)?)
    }

    /// Decode a document file: inflate, parse, unwrap the envelope, then
    /// version-check before building the typed payload.
    pub fn decode_document(bytes: &[u8]) -> CodecResult<DocumentPayload> {
        let mut json = Vec::new();
        ZlibDecoder::new(bytes).read_to_end(&mut json)?;
        trace!(compressed = bytes.len(), inflated = json.len(), "document inflated");

        let mut value = parse_json(&json)?;
        let inner = value
            .get_mut(ENVELOPE_KEY)
            .filter(|v| v.is_object())
            .map(Value::take)
            .ok_or(CodecError::MissingEnvelope { key: ENVELOPE_KEY })?;

        typed(FileKind::Document, inner)
    }

    /// Encode a document: wrap in the envelope, serialize, deflate.
    pub fn encode_document(payload: &DocumentPayload) -> CodecResult<Vec<u8>> {
        let json = serde_json::to_vec(&Envelope { payload })?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }
}

/// Parse JSON text without serde_json's nesting limit. Idea trees have no
/// depth bound, so the stack is grown on demand instead.
fn parse_json(bytes: &[u8]) -> CodecResult<Value> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Version-check `value`, then build the typed payload.
///
/// An integral float version such as `2.0` passes the check and is stored
/// back as the integer.
fn typed<T: DeserializeOwned>(kind: FileKind, mut value: Value) -> CodecResult<T> {
    check_version(kind, &value)?;
    if let Some(fields) = value.as_object_mut() {
        fields.insert(VERSION_KEY.to_string(), kind.supported_version().into());
    }
    Ok(T::deserialize(serde_stacker::Deserializer::new(value))?)
}
