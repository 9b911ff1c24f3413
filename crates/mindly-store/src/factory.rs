//! Node creation.
//!
//! The kind of node created under a parent depends on the parent's depth:
//! the virtual root takes sections, a section takes documents, and anything
//! deeper takes ideas. Each operation registers the node in the tree index
//! before touching the payload, then marks the owning file modified.

use mindly_index::{IndexedNode, NodeSlot};
use mindly_types::{
    now_timestamp, DocumentPayload, IdeaRecord, NodeId, ProxyRecord, SectionRecord,
    DEFAULT_COLOR, DEFAULT_COLOR_THEME_TYPE, DEFAULT_IDEA_TYPE, INDEX_FILENAME,
};
use serde::Serialize;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::store::Store;

/// Optional attributes for a new node.
///
/// Empty strings count as not supplied. Sections ignore every option;
/// documents use only `note` and `color`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeOptions {
    pub note: Option<String>,
    pub idea_type: Option<i64>,
    /// Inherited from the parent idea when absent.
    pub color: Option<String>,
    /// Inherited from the parent idea when absent.
    pub color_theme_type: Option<i64>,
}

impl NodeOptions {
    fn note(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }

    fn color(&self) -> Option<&str> {
        self.color.as_deref().filter(|c| !c.is_empty())
    }
}

/// The record produced by [`Store::create_node`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum CreatedNode {
    Section(SectionRecord),
    /// Root idea of the new document.
    Document(IdeaRecord),
    Idea(IdeaRecord),
}

impl CreatedNode {
    pub fn identifier(&self) -> &NodeId {
        match self {
            Self::Section(s) => &s.identifier,
            Self::Document(i) | Self::Idea(i) => &i.identifier,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Section(_) => "section",
            Self::Document(_) => "document",
            Self::Idea(_) => "idea",
        }
    }
}

impl Store {
    /// Create a node under `parent_id`, choosing its kind by the parent's
    /// depth (see the module docs).
    pub fn create_node(
        &mut self,
        parent_id: &str,
        text: &str,
        options: &NodeOptions,
    ) -> StoreResult<CreatedNode> {
        let depth = self
            .tree
            .depth(parent_id)
            .ok_or_else(|| StoreError::no_such_node(parent_id))?;
        match depth {
            0 => self.create_section(text).map(CreatedNode::Section),
            1 => self
                .create_document(text, parent_id, options.note(), options.color().unwrap_or_default())
                .map(CreatedNode::Document),
            _ => self
                .create_idea(parent_id, text, options)
                .map(CreatedNode::Idea),
        }
    }

    /// Append a section to the index.
    pub fn create_section(&mut self, text: &str) -> StoreResult<SectionRecord> {
        let id = self.fresh_id();
        let record = SectionRecord::new(id.clone(), text);

        self.tree.insert(
            IndexedNode {
                id: id.clone(),
                slot: NodeSlot::Section {
                    position: self.index.sections.len(),
                },
                id_path: vec![id.clone()],
                name_path: vec![text.to_string()],
            },
            INDEX_FILENAME,
        )?;
        self.tree.add_child(&NodeId::root(), &id);
        self.index.sections.push(record.clone());
        self.mark_modified(INDEX_FILENAME)?;

        info!(id = %id, text, "section created");
        Ok(record)
    }

    /// Create a document file in `section_id` and return its root idea.
    ///
    /// An empty `note` or `color` keeps the default.
    pub fn create_document(
        &mut self,
        text: &str,
        section_id: &str,
        note: &str,
        color: &str,
    ) -> StoreResult<IdeaRecord> {
        self.expect_parent(section_id, |depth| depth == 1, "document")?;
        let section = NodeId::new(section_id);
        let section_text = self
            .tree
            .ancestry_by_name(section_id)
            .and_then(<[String]>::last)
            .cloned()
            .unwrap_or_default();

        let id = self.fresh_id();
        let filename = self.fresh_filename(&id);
        let created = now_timestamp();

        let root = IdeaRecord::document_root(id.clone(), text, note, color);
        let mut proxy = ProxyRecord::new(id.clone(), text, &section, filename.clone(), &created);
        if let Some(color) = &root.color {
            proxy.color = color.clone();
        }

        self.tree.insert(
            IndexedNode {
                id: id.clone(),
                slot: NodeSlot::Idea { route: Vec::new() },
                id_path: vec![section.clone(), id.clone()],
                name_path: vec![section_text, text.to_string()],
            },
            &filename,
        )?;
        self.tree.push_proxy_filename(&filename);
        self.tree.add_child(&section, &id);
        self.index.proxies.push(proxy);
        self.documents
            .insert(filename.clone(), DocumentPayload::new(root.clone(), &created));
        self.mark_modified(&filename)?;

        info!(id = %id, section = %section, filename = %filename, text, "document created");
        Ok(root)
    }

    /// Append an idea to the child list of `parent_id`, a document root or
    /// another idea.
    pub fn create_idea(
        &mut self,
        parent_id: &str,
        text: &str,
        options: &NodeOptions,
    ) -> StoreResult<IdeaRecord> {
        self.expect_parent(parent_id, |depth| depth >= 2, "idea")?;
        let filename = self
            .tree
            .filename_of(parent_id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::no_such_node(parent_id))?;
        let proxy_position = self
            .tree
            .proxy_position(&filename)
            .ok_or_else(|| StoreError::UnknownFile(filename.clone()))?;
        let Some(NodeSlot::Idea { route: parent_route }) = self.tree.slot(parent_id).cloned() else {
            return Err(StoreError::no_such_node(parent_id));
        };
        let mut id_path = self
            .tree
            .ancestry_by_id(parent_id)
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
        let mut name_path = self
            .tree
            .ancestry_by_name(parent_id)
            .map(<[String]>::to_vec)
            .unwrap_or_default();

        let parent = self.idea_mut(parent_id)?;
        let position = parent.children().len();
        let color = options
            .color()
            .map(str::to_string)
            .or_else(|| parent.color.clone())
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        let color_theme_type = options
            .color_theme_type
            .or(parent.color_theme_type)
            .unwrap_or(DEFAULT_COLOR_THEME_TYPE);

        let id = self.fresh_id();
        let idea = IdeaRecord {
            note: Some(options.note().to_string()),
            idea_type: Some(options.idea_type.unwrap_or(DEFAULT_IDEA_TYPE)),
            color: Some(color),
            color_theme_type: Some(color_theme_type),
            ideas: Some(Vec::new()),
            ..IdeaRecord::new(id.clone(), text)
        };

        let mut route = parent_route;
        route.push(position);
        id_path.push(id.clone());
        name_path.push(text.to_string());
        self.tree.insert(
            IndexedNode {
                id: id.clone(),
                slot: NodeSlot::Idea { route },
                id_path,
                name_path,
            },
            &filename,
        )?;
        self.tree.add_child(&NodeId::new(parent_id), &id);

        self.idea_mut(parent_id)?.push_child(idea.clone());
        if let Some(proxy) = self.index.proxies.get_mut(proxy_position) {
            proxy.item_count += 1;
        }
        self.mark_modified(&filename)?;

        info!(id = %id, parent = parent_id, filename = %filename, text, "idea created");
        Ok(idea)
    }

    /// Fail unless `id` exists and its depth satisfies `accepts`.
    fn expect_parent(
        &self,
        id: &str,
        accepts: impl Fn(usize) -> bool,
        kind: &'static str,
    ) -> StoreResult<()> {
        let depth = self
            .tree
            .depth(id)
            .ok_or_else(|| StoreError::no_such_node(id))?;
        if accepts(depth) {
            Ok(())
        } else {
            Err(StoreError::InvalidParent {
                id: NodeId::new(id),
                depth,
                kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{empty_dir, sample_dir};
    use mindly_index::IndexError;
    use mindly_types::ROOT_ID;

    fn dirty(store: &Store) -> Vec<&str> {
        store.dirty_files().collect()
    }

    #[test]
    fn section_on_empty_index() {
        let dir = empty_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let section = store.create_section("Work").unwrap();
        let id = section.identifier.as_str();

        assert_eq!(store.tree().ancestry_by_name(id).unwrap(), &["Work"]);
        assert_eq!(store.tree().children(ROOT_ID), &[section.identifier.clone()]);
        assert!(store.tree().children(id).is_empty());
        assert_eq!(store.tree().filename_of(id), Some(INDEX_FILENAME));
        assert_eq!(store.index_payload().sections, vec![section.clone()]);
        assert_eq!(dirty(&store), vec![INDEX_FILENAME]);
    }

    #[test]
    fn document_under_new_section() {
        let dir = empty_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let work = store.create_section("Work").unwrap().identifier;
        let root = store.create_document("Notes", work.as_str(), "", "").unwrap();
        let id = root.identifier.as_str();

        assert_eq!(store.tree().ancestry_by_name(id).unwrap(), &["Work", "Notes"]);
        assert_eq!(
            store.tree().ancestry_by_id(id).unwrap(),
            &[work.clone(), root.identifier.clone()]
        );
        assert_eq!(store.tree().children(work.as_str()), &[root.identifier.clone()]);

        let proxy = &store.index_payload().proxies[0];
        assert_eq!(proxy.item_count, 1);
        assert_eq!(proxy.identifier, root.identifier);
        assert_eq!(proxy.text, "Notes");
        assert_eq!(proxy.section, work.as_str());
        assert_eq!(proxy.color, DEFAULT_COLOR);
        assert!(!proxy.has_note);

        let filename = proxy.filename.clone();
        assert!(filename.ends_with(".mndl"));
        assert_ne!(filename, format!("{id}.mndl"));
        assert_eq!(store.tree().filename_of(id), Some(filename.as_str()));
        assert_eq!(store.document(&filename).unwrap().idea, root);
        assert_eq!(root.idea_type, Some(DEFAULT_IDEA_TYPE));
        assert_eq!(root.note.as_deref(), Some(""));

        let mut expected = vec![filename.as_str(), INDEX_FILENAME];
        expected.sort();
        assert_eq!(dirty(&store), expected);
        assert!(store.consistency_findings().is_empty());
    }

    #[test]
    fn idea_under_document_inherits_defaults() {
        let dir = empty_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let work = store.create_section("Work").unwrap().identifier;
        let doc = store.create_document("Notes", work.as_str(), "", "").unwrap();
        let idea = store
            .create_idea(doc.identifier.as_str(), "Detail", &NodeOptions::default())
            .unwrap();

        assert_eq!(
            store.tree().ancestry_by_name(idea.identifier.as_str()).unwrap(),
            &["Work", "Notes", "Detail"]
        );
        assert_eq!(store.index_payload().proxies[0].item_count, 2);
        assert_eq!(idea.color, doc.color);
        assert_eq!(idea.color_theme_type, doc.color_theme_type);
        assert_eq!(idea.ideas, Some(Vec::new()));
        assert!(store.consistency_findings().is_empty());
    }

    #[test]
    fn idea_inherits_parent_color_unless_given() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();

        let inherited = store.create_idea("d1", "Plain", &NodeOptions::default()).unwrap();
        assert_eq!(inherited.color.as_deref(), Some("red0"));
        assert_eq!(inherited.color_theme_type, Some(2));

        let explicit = store
            .create_idea(
                "d1",
                "Styled",
                &NodeOptions {
                    color: Some("green3".into()),
                    color_theme_type: Some(0),
                    idea_type: Some(3),
                    note: Some("see also".into()),
                },
            )
            .unwrap();
        assert_eq!(explicit.color.as_deref(), Some("green3"));
        assert_eq!(explicit.color_theme_type, Some(0));
        assert_eq!(explicit.idea_type, Some(3));
        assert_eq!(explicit.note.as_deref(), Some("see also"));

        let blank = store
            .create_idea(
                "d1",
                "Blank",
                &NodeOptions {
                    color: Some(String::new()),
                    ..NodeOptions::default()
                },
            )
            .unwrap();
        assert_eq!(blank.color.as_deref(), Some("red0"));

        // A parent with no color of its own falls back to the default.
        let leaf = store.create_idea("i2", "Leaf", &NodeOptions::default()).unwrap();
        assert_eq!(leaf.color.as_deref(), Some(DEFAULT_COLOR));
        assert_eq!(leaf.color_theme_type, Some(DEFAULT_COLOR_THEME_TYPE));
    }

    #[test]
    fn nested_idea_initializes_child_list_and_is_addressable() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let leaf = store.create_idea("i2", "Leaf", &NodeOptions::default()).unwrap();
        let id = leaf.identifier.as_str();

        assert_eq!(store.node(id).unwrap().text(), "Leaf");
        let doc = store.document("d1.mndl").unwrap();
        assert_eq!(doc.idea.children()[0].children()[0].children()[0], leaf);
        assert_eq!(store.index_payload().proxies[0].item_count, 5);
        assert_eq!(
            store
                .lookup_by_name_path(&["Work", "Notes", "Detail", "Deeper", "Leaf"])
                .unwrap(),
            leaf.identifier
        );
        assert_eq!(dirty(&store), vec!["d1.mndl", INDEX_FILENAME]);
        assert!(!store.is_dirty("d2.mndl"));
        assert!(store.consistency_findings().is_empty());
    }

    #[test]
    fn create_node_dispatches_on_depth() {
        let dir = empty_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let opts = NodeOptions::default();

        let section = store.create_node(ROOT_ID, "Work", &opts).unwrap();
        assert_eq!(section.kind(), "section");
        let doc = store
            .create_node(section.identifier().as_str(), "Notes", &opts)
            .unwrap();
        assert!(matches!(doc, CreatedNode::Document(_)));
        let idea = store
            .create_node(doc.identifier().as_str(), "Detail", &opts)
            .unwrap();
        assert!(matches!(idea, CreatedNode::Idea(_)));
        let deeper = store
            .create_node(idea.identifier().as_str(), "Deeper", &opts)
            .unwrap();
        assert!(matches!(deeper, CreatedNode::Idea(_)));

        assert_eq!(store.tree().walk().len(), 4);
        assert_eq!(store.index_payload().proxies[0].item_count, 3);
    }

    #[test]
    fn lookup_becomes_ambiguous_after_duplicate_name() {
        let dir = empty_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let work = store.create_section("Work").unwrap().identifier;
        let first = store.create_document("Notes", work.as_str(), "", "").unwrap();

        assert_eq!(
            store.lookup_by_name_path(&["Work", "Notes"]).unwrap(),
            first.identifier
        );
        assert!(matches!(
            store.lookup_by_name_path(&["Work", "Nothing"]),
            Err(StoreError::Index(IndexError::NoSuchNode(_)))
        ));

        let second = store.create_document("Notes", work.as_str(), "", "").unwrap();
        match store.lookup_by_name_path(&["Work", "Notes"]) {
            Err(StoreError::Index(IndexError::AmbiguousPath { matches, .. })) => {
                assert_eq!(matches.len(), 2);
                assert!(matches.contains(&first.identifier));
                assert!(matches.contains(&second.identifier));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn wrong_parent_depth_is_rejected() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();

        assert!(matches!(
            store.create_document("Doc", "i1", "", ""),
            Err(StoreError::InvalidParent { depth: 3, kind: "document", .. })
        ));
        assert!(matches!(
            store.create_idea("s1", "Idea", &NodeOptions::default()),
            Err(StoreError::InvalidParent { depth: 1, kind: "idea", .. })
        ));
        assert!(matches!(
            store.create_node("missing", "X", &NodeOptions::default()),
            Err(StoreError::Index(IndexError::NoSuchNode(_)))
        ));
        assert_eq!(store.dirty_files().count(), 0);
        assert_eq!(store.tree().len(), 7);
    }

    #[test]
    fn document_options_override_defaults() {
        let dir = sample_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let root = store.create_document("Plans", "s2", "remember", "yellow2").unwrap();

        assert_eq!(root.note.as_deref(), Some("remember"));
        assert_eq!(root.color.as_deref(), Some("yellow2"));
        let proxy = store.index_payload().proxies.last().unwrap();
        assert_eq!(proxy.color, "yellow2");
        assert_eq!(store.tree().proxy_filenames().len(), 3);
        assert_eq!(
            store.tree().ancestry_by_name(root.identifier.as_str()).unwrap(),
            &["Home", "Plans"]
        );
    }

    #[test]
    fn generated_identifiers_are_unique() {
        let dir = empty_dir();
        let mut store = Store::open(dir.path()).unwrap();
        let work = store.create_section("Work").unwrap().identifier;
        let doc = store.create_document("Notes", work.as_str(), "", "").unwrap();
        for n in 0..50 {
            store
                .create_idea(doc.identifier.as_str(), &format!("idea {n}"), &NodeOptions::default())
                .unwrap();
        }
        assert_eq!(store.tree().len(), 52);
        assert_eq!(store.index_payload().proxies[0].item_count, 51);
        store.tree().verify().unwrap();
    }
}
