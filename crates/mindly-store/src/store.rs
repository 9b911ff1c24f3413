use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use mindly_codec::MindlyCodec;
use mindly_index::{extract_document_tree, index_sections, NodeSlot, TreeIndex};
use mindly_types::{
    generate_id, now_timestamp, DocumentPayload, IdeaRecord, IndexPayload, NodeId, SectionRecord,
    DOCUMENT_EXTENSION, INDEX_FILENAME,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Read-only view of a node's record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeRef<'a> {
    Section(&'a SectionRecord),
    /// A document root idea or a nested idea.
    Idea(&'a IdeaRecord),
}

impl<'a> NodeRef<'a> {
    pub fn identifier(&self) -> &'a NodeId {
        match self {
            Self::Section(s) => &s.identifier,
            Self::Idea(i) => &i.identifier,
        }
    }

    pub fn text(&self) -> &'a str {
        match self {
            Self::Section(s) => &s.text,
            Self::Idea(i) => &i.text,
        }
    }
}

/// Decoded contents of a data directory.
struct Loaded {
    index: IndexPayload,
    documents: BTreeMap<String, DocumentPayload>,
    tree: TreeIndex,
}

/// Owner of one loaded Mindly data directory.
///
/// All mutation goes through the node-creation methods, which keep the
/// payloads, the [`TreeIndex`], and the dirty set in step.
#[derive(Debug)]
pub struct Store {
    data_dir: PathBuf,
    pub(crate) index: IndexPayload,
    pub(crate) documents: BTreeMap<String, DocumentPayload>,
    pub(crate) tree: TreeIndex,
    pub(crate) dirty: BTreeSet<String>,
}

impl Store {
    /// Load the data directory at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let mut store = Self {
            data_dir: data_dir.into(),
            index: IndexPayload::empty(),
            documents: BTreeMap::new(),
            tree: TreeIndex::new(),
            dirty: BTreeSet::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Discard all in-memory state and load again from disk.
    ///
    /// Unwritten changes are lost. On failure the store is left empty and
    /// must be reloaded successfully before further use.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.index = IndexPayload::empty();
        self.documents.clear();
        self.tree = TreeIndex::new();
        self.dirty.clear();

        let loaded = load_dir(&self.data_dir)?;
        self.index = loaded.index;
        self.documents = loaded.documents;
        self.tree = loaded.tree;

        info!(
            data_dir = %self.data_dir.display(),
            sections = self.index.sections.len(),
            documents = self.documents.len(),
            nodes = self.tree.len(),
            "mindly data loaded"
        );
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// The forest and its indices.
    pub fn tree(&self) -> &TreeIndex {
        &self.tree
    }

    pub fn index_payload(&self) -> &IndexPayload {
        &self.index
    }

    pub fn document(&self, filename: &str) -> Option<&DocumentPayload> {
        self.documents.get(filename)
    }

    /// Loaded documents keyed by filename.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &DocumentPayload)> {
        self.documents.iter().map(|(name, doc)| (name.as_str(), doc))
    }

    /// The record for `id`.
    pub fn node(&self, id: &str) -> StoreResult<NodeRef<'_>> {
        match self.tree.slot(id) {
            Some(NodeSlot::Section { position }) => self
                .index
                .sections
                .get(*position)
                .map(NodeRef::Section)
                .ok_or_else(|| StoreError::no_such_node(id)),
            Some(NodeSlot::Idea { route }) => {
                let filename = self
                    .tree
                    .filename_of(id)
                    .ok_or_else(|| StoreError::no_such_node(id))?;
                self.documents
                    .get(filename)
                    .and_then(|doc| doc.idea.at_route(route))
                    .map(NodeRef::Idea)
                    .ok_or_else(|| StoreError::no_such_node(id))
            }
            None => Err(StoreError::no_such_node(id)),
        }
    }

    /// The single node whose name lineage is exactly `path`.
    pub fn lookup_by_name_path<S: AsRef<str>>(&self, path: &[S]) -> StoreResult<NodeId> {
        Ok(self.tree.lookup_by_name_path(path)?)
    }

    /// Every node whose name lineage is exactly `path`.
    pub fn name_path_matches<S: AsRef<str>>(&self, path: &[S]) -> Vec<NodeId> {
        self.tree.name_path_matches(path)
    }

    /// Files changed since the last successful write, in write order.
    pub fn dirty_files(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn is_dirty(&self, filename: &str) -> bool {
        self.dirty.contains(filename)
    }

    /// Index findings plus proxy/document disagreements.
    pub fn consistency_findings(&self) -> Vec<String> {
        let mut findings = self.tree.consistency_findings();
        for proxy in &self.index.proxies {
            let Some(doc) = self.documents.get(&proxy.filename) else {
                findings.push(format!("{}: proxy file not loaded", proxy.filename));
                continue;
            };
            if doc.idea.identifier != proxy.identifier {
                findings.push(format!(
                    "{}: proxy id {} but root idea id {}",
                    proxy.filename, proxy.identifier, doc.idea.identifier
                ));
            }
            if doc.idea.text != proxy.text {
                findings.push(format!(
                    "{}: proxy text {:?} but root idea text {:?}",
                    proxy.filename, proxy.text, doc.idea.text
                ));
            }
            let count = doc.idea.subtree_len() as u64;
            if proxy.item_count != count {
                findings.push(format!(
                    "{}: itemCount {} but {} ideas",
                    proxy.filename, proxy.item_count, count
                ));
            }
        }
        findings
    }

    // ---------------------------------------------------------------
    // Mutation plumbing
    // ---------------------------------------------------------------

    /// Flag `filename` for the next write.
    ///
    /// For a document this also stamps `dateModified` on the document and
    /// on its proxy, and marks the index dirty as well.
    pub(crate) fn mark_modified(&mut self, filename: &str) -> StoreResult<()> {
        if filename == INDEX_FILENAME {
            self.dirty.insert(filename.to_string());
            return Ok(());
        }

        let position = self
            .tree
            .proxy_position(filename)
            .ok_or_else(|| StoreError::UnknownFile(filename.to_string()))?;
        let (Some(doc), Some(proxy)) = (
            self.documents.get_mut(filename),
            self.index.proxies.get_mut(position),
        ) else {
            return Err(StoreError::UnknownFile(filename.to_string()));
        };

        let stamp = now_timestamp();
        doc.date_modified = stamp.clone();
        proxy.date_modified = stamp;
        self.dirty.insert(filename.to_string());
        debug!(filename, "marked modified");

        self.mark_modified(INDEX_FILENAME)
    }

    /// Mutable access to an idea record by id.
    pub(crate) fn idea_mut(&mut self, id: &str) -> StoreResult<&mut IdeaRecord> {
        let Some(NodeSlot::Idea { route }) = self.tree.slot(id) else {
            return Err(StoreError::no_such_node(id));
        };
        let filename = self
            .tree
            .filename_of(id)
            .ok_or_else(|| StoreError::no_such_node(id))?;
        self.documents
            .get_mut(filename)
            .and_then(|doc| doc.idea.at_route_mut(route))
            .ok_or_else(|| StoreError::no_such_node(id))
    }

    /// An identifier not yet used by any node in this session.
    pub(crate) fn fresh_id(&self) -> NodeId {
        generate_id(|c| self.tree.contains(c))
    }

    /// A new document filename distinct from `id` and every loaded file.
    pub(crate) fn fresh_filename(&self, id: &NodeId) -> String {
        let stem = generate_id(|c| {
            c == id.as_str()
                || self.tree.contains(c)
                || self
                    .documents
                    .contains_key(&format!("{c}.{DOCUMENT_EXTENSION}"))
        });
        format!("{stem}.{DOCUMENT_EXTENSION}")
    }
}

fn read_file(path: &Path) -> StoreResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_dir(dir: &Path) -> StoreResult<Loaded> {
    let bytes = read_file(&dir.join(INDEX_FILENAME))?;
    let index = MindlyCodec::decode_index(&bytes).map_err(|source| StoreError::Codec {
        filename: INDEX_FILENAME.to_string(),
        source,
    })?;

    let mut tree = TreeIndex::new();
    tree.absorb(index_sections(&index.sections), INDEX_FILENAME)?;

    let mut documents = BTreeMap::new();
    for proxy in &index.proxies {
        let section = NodeId::new(proxy.section.clone());
        if tree.depth(section.as_str()) != Some(1) {
            return Err(StoreError::no_such_node(format!(
                "section {:?} of {}",
                proxy.section, proxy.filename
            )));
        }
        let section_names = tree
            .ancestry_by_name(section.as_str())
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let bytes = read_file(&dir.join(&proxy.filename))?;
        let doc = MindlyCodec::decode_document(&bytes).map_err(|source| StoreError::Codec {
            filename: proxy.filename.clone(),
            source,
        })?;

        let doc_id = doc.idea.identifier.clone();
        if doc_id != proxy.identifier {
            warn!(
                filename = %proxy.filename,
                proxy = %proxy.identifier,
                root = %doc_id,
                "proxy and root idea identifiers differ; indexing by root idea"
            );
        }

        tree.push_proxy_filename(&proxy.filename);
        tree.add_child(&section, &doc_id);
        let fragment = extract_document_tree(&doc.idea, vec![section, doc_id], &section_names);
        debug!(filename = %proxy.filename, ideas = fragment.nodes.len(), "document indexed");
        tree.absorb(fragment, &proxy.filename)?;

        documents.insert(proxy.filename.clone(), doc);
    }

    Ok(Loaded {
        index,
        documents,
        tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{empty_dir, sample_dir, write_document, STAMP};
    use mindly_index::IndexError;
    use serde_json::json;

    #[test]
    fn open_indexes_sections_documents_and_ideas() {
        let dir = sample_dir();
        let store = Store::open(dir.path()).unwrap();
        let tree = store.tree();

        assert_eq!(tree.len(), 7);
        assert_eq!(tree.children("__root"), &[NodeId::new("s1"), NodeId::new("s2")]);
        assert_eq!(tree.children("s1"), &[NodeId::new("d1")]);
        assert_eq!(tree.children("d1"), &[NodeId::new("i1"), NodeId::new("i3")]);
        assert_eq!(
            tree.ancestry_by_name("i2").unwrap(),
            &["Work", "Notes", "Detail", "Deeper"]
        );
        assert_eq!(
            tree.ancestry_by_id("i2").unwrap(),
            &[
                NodeId::new("s1"),
                NodeId::new("d1"),
                NodeId::new("i1"),
                NodeId::new("i2")
            ]
        );
        assert_eq!(tree.filename_of("s2"), Some(INDEX_FILENAME));
        assert_eq!(tree.filename_of("i3"), Some("d1.mndl"));
        assert_eq!(tree.proxy_filenames(), &["d1.mndl", "d2.mndl"]);
        assert_eq!(store.dirty_files().count(), 0);
        tree.verify().unwrap();
        assert!(store.consistency_findings().is_empty());
    }

    #[test]
    fn ancestries_have_equal_length_and_parents_list_children() {
        let dir = sample_dir();
        let store = Store::open(dir.path()).unwrap();
        let tree = store.tree();
        for id in tree.ids() {
            let by_id = tree.ancestry_by_id(id.as_str()).unwrap();
            let by_name = tree.ancestry_by_name(id.as_str()).unwrap();
            assert_eq!(by_id.len(), by_name.len());
            if by_id.len() > 1 {
                let parent = &by_id[by_id.len() - 2];
                assert!(tree.children(parent.as_str()).contains(id));
            }
        }
    }

    #[test]
    fn node_reads_through_to_payload() {
        let dir = sample_dir();
        let store = Store::open(dir.path()).unwrap();

        assert!(matches!(store.node("s2").unwrap(), NodeRef::Section(s) if s.text == "Home"));
        let deeper = store.node("i2").unwrap();
        assert_eq!(deeper.text(), "Deeper");
        assert_eq!(deeper.identifier().as_str(), "i2");
        assert!(matches!(
            store.node("nope"),
            Err(StoreError::Index(IndexError::NoSuchNode(_)))
        ));
        assert!(store.node("__root").is_err());
    }

    #[test]
    fn lookup_by_name_path() {
        let dir = sample_dir();
        let store = Store::open(dir.path()).unwrap();
        assert_eq!(
            store.lookup_by_name_path(&["Work", "Notes", "Detail"]).unwrap(),
            NodeId::new("i1")
        );
        assert!(matches!(
            store.lookup_by_name_path(&["Work", "Nothing"]),
            Err(StoreError::Index(IndexError::NoSuchNode(_)))
        ));
        assert!(store.name_path_matches(&["Detail"]).is_empty());
    }

    #[test]
    fn reload_is_idempotent() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let first = store.tree().clone();
        let first_index = store.index_payload().clone();
        store.reload().unwrap();
        assert_eq!(store.tree(), &first);
        assert_eq!(store.index_payload(), &first_index);
    }

    #[test]
    fn unsupported_document_version_fails_before_indexing() {
        let dir = sample_dir();
        let mut doc = Store::open(dir.path()).unwrap().document("d2.mndl").unwrap().clone();
        doc.file_format_version = 5;
        write_document(dir.path(), "d2.mndl", &doc);

        let err = Store::open(dir.path()).unwrap_err();
        assert!(err.is_format_version());
        assert!(err.to_string().starts_with("d2.mndl: document version 5"));
    }

    #[test]
    fn unsupported_index_version_fails() {
        let dir = empty_dir();
        std::fs::write(
            dir.path().join(INDEX_FILENAME),
            br#"{"fileFormatVersion":1,"sections":[],"proxies":[]}"#,
        )
        .unwrap();
        assert!(Store::open(dir.path()).unwrap_err().is_format_version());
    }

    #[test]
    fn failed_reload_leaves_store_empty() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        std::fs::remove_file(dir.path().join("d2.mndl")).unwrap();

        let err = store.reload().unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(store.tree().is_empty());
        assert!(store.documents().next().is_none());
        assert!(store.index_payload().sections.is_empty());
    }

    #[test]
    fn missing_index_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Store::open(dir.path()).unwrap_err(),
            StoreError::Io { .. }
        ));
    }

    #[test]
    fn proxy_with_unknown_section_fails() {
        let dir = sample_dir();
        let mut index = Store::open(dir.path()).unwrap().index_payload().clone();
        index.proxies[1].section = "gone".into();
        crate::fixtures::write_index(dir.path(), &index);
        assert!(matches!(
            Store::open(dir.path()).unwrap_err(),
            StoreError::Index(IndexError::NoSuchNode(_))
        ));
    }

    #[test]
    fn duplicate_identifier_across_documents_fails() {
        let dir = sample_dir();
        let doc: DocumentPayload = serde_json::from_value(json!({
            "fileFormatVersion": 4, "dateCreated": STAMP, "dateModified": STAMP,
            "idea": {"identifier": "d2", "text": "Lists", "ideas": [
                {"identifier": "i1", "text": "Clash"}
            ]}
        }))
        .unwrap();
        write_document(dir.path(), "d2.mndl", &doc);
        assert!(matches!(
            Store::open(dir.path()).unwrap_err(),
            StoreError::Index(IndexError::DuplicateNode(_))
        ));
    }

    #[test]
    fn mark_modified_cascades_to_index() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        store.mark_modified("d2.mndl").unwrap();

        assert_eq!(store.dirty_files().collect::<Vec<_>>(), vec!["d2.mndl", INDEX_FILENAME]);
        let stamp = &store.document("d2.mndl").unwrap().date_modified;
        assert_ne!(stamp, STAMP);
        assert_eq!(&store.index_payload().proxies[1].date_modified, stamp);
        assert_eq!(store.index_payload().proxies[0].date_modified, STAMP);
    }

    #[test]
    fn mark_modified_index_only() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        store.mark_modified(INDEX_FILENAME).unwrap();
        assert_eq!(store.dirty_files().collect::<Vec<_>>(), vec![INDEX_FILENAME]);
        assert!(store
            .index_payload()
            .proxies
            .iter()
            .all(|p| p.date_modified == STAMP));
    }

    #[test]
    fn mark_modified_unknown_file() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        assert!(matches!(
            store.mark_modified("ghost.mndl"),
            Err(StoreError::UnknownFile(_))
        ));
        assert_eq!(store.dirty_files().count(), 0);
    }

    #[test]
    fn fresh_ids_avoid_loaded_nodes() {
        let dir = sample_dir();
        let store = Store::open(dir.path()).unwrap();
        for _ in 0..20 {
            let id = store.fresh_id();
            assert!(!store.tree().contains(id.as_str()));
            assert!(id.as_str().starts_with("id"));
            let filename = store.fresh_filename(&id);
            assert_ne!(filename, format!("{id}.mndl"));
            assert!(store.document(&filename).is_none());
        }
    }

    #[test]
    fn item_count_mismatch_is_reported() {
        let dir = sample_dir();
        let mut index = Store::open(dir.path()).unwrap().index_payload().clone();
        index.proxies[0].item_count = 9;
        crate::fixtures::write_index(dir.path(), &index);

        let store = Store::open(dir.path()).unwrap();
        assert_eq!(
            store.consistency_findings(),
            vec!["d1.mndl: itemCount 9 but 4 ideas".to_string()]
        );
    }
}
