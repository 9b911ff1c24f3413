//! Derivation of nodes and child lists from decoded payloads.
//!
//! Both entry points are pure: they read records and return a
//! [`TreeFragment`] for [`TreeIndex::absorb`](crate::TreeIndex::absorb) to
//! merge. Ancestry sequences are carried down the walk rather than looked up
//! in a partially built index.

use mindly_types::{IdeaRecord, NodeId, SectionRecord};

/// Where a node's record lives inside its owning payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeSlot {
    /// Position in the index's section list.
    Section { position: usize },
    /// Child positions leading from the document's root idea to this idea.
    /// The root idea itself has an empty route.
    Idea { route: Vec<usize> },
}

/// One node as seen by the indexer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedNode {
    pub id: NodeId,
    pub slot: NodeSlot,
    /// Lineage by identifier, ending with `id`.
    pub id_path: Vec<NodeId>,
    /// Lineage by display text, parallel to `id_path`.
    pub name_path: Vec<String>,
}

/// Nodes and child lists derived from one payload, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeFragment {
    pub nodes: Vec<IndexedNode>,
    /// `(parent, children)` pairs; children are appended to any existing list.
    pub children: Vec<(NodeId, Vec<NodeId>)>,
}

/// Index the index file's sections as children of the virtual root.
///
/// Every section gets a single-element ancestry and an empty child list.
pub fn index_sections(sections: &[SectionRecord]) -> TreeFragment {
    let mut fragment = TreeFragment::default();
    let mut top_level = Vec::with_capacity(sections.len());

    for (position, section) in sections.iter().enumerate() {
        let id = section.identifier.clone();
        top_level.push(id.clone());
        fragment.children.push((id.clone(), Vec::new()));
        fragment.nodes.push(IndexedNode {
            id: id.clone(),
            slot: NodeSlot::Section { position },
            id_path: vec![id],
            name_path: vec![section.text.clone()],
        });
    }

    fragment.children.insert(0, (NodeId::root(), top_level));
    fragment
}

/// Flatten a document's idea tree.
///
/// `id_path` is the root idea's lineage (`[section, document]`) and
/// `parent_names` the name lineage of the node above it (`[section text]`).
/// A child list is recorded only for ideas that have children.
pub fn extract_document_tree(
    root: &IdeaRecord,
    id_path: Vec<NodeId>,
    parent_names: &[String],
) -> TreeFragment {
    let mut fragment = TreeFragment::default();
    let mut route = Vec::new();
    walk(root, id_path, parent_names.to_vec(), &mut route, &mut fragment);
    fragment
}

fn walk(
    idea: &IdeaRecord,
    id_path: Vec<NodeId>,
    mut name_path: Vec<String>,
    route: &mut Vec<usize>,
    fragment: &mut TreeFragment,
) {
    name_path.push(idea.text.clone());

    let children = idea.children();
    if !children.is_empty() {
        let ids = children.iter().map(|c| c.identifier.clone()).collect();
        fragment.children.push((idea.identifier.clone(), ids));
    }

    fragment.nodes.push(IndexedNode {
        id: idea.identifier.clone(),
        slot: NodeSlot::Idea {
            route: route.clone(),
        },
        id_path: id_path.clone(),
        name_path: name_path.clone(),
    });

    for (pos, child) in children.iter().enumerate() {
        let mut child_path = id_path.clone();
        child_path.push(child.identifier.clone());
        route.push(pos);
        walk(child, child_path, name_path.clone(), route, fragment);
        route.pop();
    }
}
