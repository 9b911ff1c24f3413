//! Persisting dirty files.

use std::fs;

use mindly_codec::MindlyCodec;
use mindly_types::INDEX_FILENAME;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult, WriteFailure};
use crate::store::Store;

impl Store {
    /// Write every dirty file to the data directory. Returns the number of
    /// files written.
    ///
    /// Every dirty file is attempted. Files written successfully leave the
    /// dirty set; failed ones stay in it and are reported together as
    /// [`StoreError::WriteBack`].
    pub fn write(&mut self) -> StoreResult<usize> {
        let pending: Vec<String> = self.dirty.iter().cloned().collect();
        let mut written = 0;
        let mut failures = Vec::new();

        for filename in pending {
            match self.write_file(&filename) {
                Ok(bytes) => {
                    debug!(filename = %filename, bytes, "file written");
                    self.dirty.remove(&filename);
                    written += 1;
                }
                Err(error) => {
                    warn!(filename = %filename, %error, "write failed; file stays dirty");
                    failures.push(WriteFailure { filename, error });
                }
            }
        }

        if failures.is_empty() {
            info!(written, data_dir = %self.data_dir().display(), "write-back complete");
            Ok(written)
        } else {
            Err(StoreError::WriteBack { failures })
        }
    }

    /// Encode `filename`'s payload with the codec for its kind.
    fn encode_file(&self, filename: &str) -> StoreResult<Vec<u8>> {
        let encoded = if filename == INDEX_FILENAME {
            MindlyCodec::encode_index(&self.index)
        } else {
            let doc = self
                .documents
                .get(filename)
                .ok_or_else(|| StoreError::UnknownFile(filename.to_string()))?;
            MindlyCodec::encode_document(doc)
        };
        encoded.map_err(|source| StoreError::Codec {
            filename: filename.to_string(),
            source,
        })
    }

    fn write_file(&self, filename: &str) -> StoreResult<usize> {
        let bytes = self.encode_file(filename)?;
        let path = self.data_dir().join(filename);
        fs::write(&path, &bytes).map_err(|source| StoreError::Io { path, source })?;
        Ok(bytes.len())
    }
}
