//! On-disk data directories for tests.

use std::path::Path;

use mindly_codec::MindlyCodec;
use mindly_types::{DocumentPayload, IndexPayload, INDEX_FILENAME};
use serde_json::json;
use tempfile::TempDir;

pub(crate) const STAMP: &str = "2024-05-01 09:30:00 +0000";

pub(crate) fn write_index(dir: &Path, index: &IndexPayload) {
    std::fs::write(
        dir.join(INDEX_FILENAME),
        MindlyCodec::encode_index(index).unwrap(),
    )
    .unwrap();
}

pub(crate) fn write_document(dir: &Path, filename: &str, doc: &DocumentPayload) {
    std::fs::write(dir.join(filename), MindlyCodec::encode_document(doc).unwrap()).unwrap();
}

/// A directory holding an index with no sections.
pub(crate) fn empty_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_index(dir.path(), &IndexPayload::empty());
    dir
}

/// Two sections, "Work" (`s1`) and "Home" (`s2`).
///
/// Work holds document "Notes" (`d1`, `d1.mndl`):
/// Detail (`i1`) > Deeper (`i2`), then Other (`i3`).
/// Home holds document "Lists" (`d2`, `d2.mndl`) with no ideas.
pub(crate) fn sample_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();

    let index: IndexPayload = serde_json::from_value(json!({
        "fileFormatVersion": 2,
        "sections": [
            {"identifier": "s1", "text": "Work"},
            {"identifier": "s2", "text": "Home", "color": "green1"}
        ],
        "proxies": [
            {"identifier": "d1", "text": "Notes", "section": "s1", "filename": "d1.mndl",
             "dateCreated": STAMP, "dateModified": STAMP, "itemCount": 4,
             "hasNote": false, "hasWebLink": false, "color": "red0"},
            {"identifier": "d2", "text": "Lists", "section": "s2", "filename": "d2.mndl",
             "dateCreated": STAMP, "dateModified": STAMP, "itemCount": 1,
             "hasNote": false, "hasWebLink": false, "color": "blue0"}
        ]
    }))
    .unwrap();
    write_index(dir.path(), &index);

    let notes: DocumentPayload = serde_json::from_value(json!({
        "fileFormatVersion": 4,
        "dateCreated": STAMP,
        "dateModified": STAMP,
        "idea": {
            "identifier": "d1", "text": "Notes", "ideaType": 1, "note": "",
            "color": "red0", "colorThemeType": 2,
            "ideas": [
                {"identifier": "i1", "text": "Detail", "ideas": [
                    {"identifier": "i2", "text": "Deeper"}
                ]},
                {"identifier": "i3", "text": "Other"}
            ]
        }
    }))
    .unwrap();
    write_document(dir.path(), "d1.mndl", &notes);

    let lists: DocumentPayload = serde_json::from_value(json!({
        "fileFormatVersion": 4,
        "dateCreated": STAMP,
        "dateModified": STAMP,
        "idea": {"identifier": "d2", "text": "Lists", "ideaType": 1, "note": "",
                 "color": "blue0", "colorThemeType": 0}
    }))
    .unwrap();
    write_document(dir.path(), "d2.mndl", &lists);

    dir
}
