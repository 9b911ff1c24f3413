//! The node forest and its derived indices.
//!
//! [`TreeIndex`] is purely in-memory and never edited by hand: nodes enter
//! through [`TreeIndex::absorb`] (load) or [`TreeIndex::insert`] (creation),
//! which update every index in the same step.

use std::collections::{BTreeMap, HashMap};

use mindly_types::{NodeId, ROOT_ID};
use tracing::trace;

use crate::error::{IndexError, IndexResult};
use crate::indexer::{IndexedNode, NodeSlot, TreeFragment};

/// The forest plus ancestry, structure, and filename indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeIndex {
    forest: BTreeMap<NodeId, NodeSlot>,
    ancestry_by_id: HashMap<NodeId, Vec<NodeId>>,
    ancestry_by_name: HashMap<NodeId, Vec<String>>,
    structure: HashMap<NodeId, Vec<NodeId>>,
    filename_by_id: HashMap<NodeId, String>,
    proxy_filenames: Vec<String>,
}

impl Default for TreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeIndex {
    /// An index holding only the virtual root.
    pub fn new() -> Self {
        let root = NodeId::root();
        Self {
            forest: BTreeMap::new(),
            ancestry_by_id: HashMap::from([(root.clone(), Vec::new())]),
            ancestry_by_name: HashMap::from([(root.clone(), Vec::new())]),
            structure: HashMap::from([(root, Vec::new())]),
            filename_by_id: HashMap::new(),
            proxy_filenames: Vec::new(),
        }
    }

    /// Number of nodes in the forest (the virtual root is not counted).
    pub fn len(&self) -> usize {
        self.forest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    /// `true` for any forest node and for the virtual root.
    pub fn contains(&self, id: &str) -> bool {
        self.ancestry_by_id.contains_key(id)
    }

    // ---------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------

    /// Merge a fragment produced by the indexer; its nodes are owned by
    /// `filename`.
    pub fn absorb(&mut self, fragment: TreeFragment, filename: &str) -> IndexResult<()> {
        for node in fragment.nodes {
            self.insert(node, filename)?;
        }
        for (parent, children) in fragment.children {
            self.structure.entry(parent).or_default().extend(children);
        }
        Ok(())
    }

    /// Register one node in the forest, both ancestries, and the filename
    /// index. Child lists are left to the caller.
    pub fn insert(&mut self, node: IndexedNode, filename: &str) -> IndexResult<()> {
        if self.contains(node.id.as_str()) {
            return Err(IndexError::DuplicateNode(node.id));
        }
        trace!(id = %node.id, depth = node.id_path.len(), filename, "node indexed");
        self.filename_by_id.insert(node.id.clone(), filename.to_string());
        self.ancestry_by_id.insert(node.id.clone(), node.id_path);
        self.ancestry_by_name.insert(node.id.clone(), node.name_path);
        self.forest.insert(node.id, node.slot);
        Ok(())
    }

    /// Append `child` to `parent`'s child list, creating it if absent, and
    /// give `child` an empty list of its own.
    pub fn add_child(&mut self, parent: &NodeId, child: &NodeId) {
        self.structure
            .entry(parent.clone())
            .or_default()
            .push(child.clone());
        self.structure.entry(child.clone()).or_default();
    }

    /// Record a document filename in proxy order. Returns its position.
    pub fn push_proxy_filename(&mut self, filename: &str) -> usize {
        self.proxy_filenames.push(filename.to_string());
        self.proxy_filenames.len() - 1
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Where the node's record lives. `None` for unknown ids and the root.
    pub fn slot(&self, id: &str) -> Option<&NodeSlot> {
        self.forest.get(id)
    }

    pub fn ancestry_by_id(&self, id: &str) -> Option<&[NodeId]> {
        self.ancestry_by_id.get(id).map(Vec::as_slice)
    }

    pub fn ancestry_by_name(&self, id: &str) -> Option<&[String]> {
        self.ancestry_by_name.get(id).map(Vec::as_slice)
    }

    /// Length of the node's ancestry: 0 for the root, 1 for sections,
    /// 2 for document roots, more for nested ideas.
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.ancestry_by_id.get(id).map(Vec::len)
    }

    /// Direct children in display order; empty for leaves.
    pub fn children(&self, id: &str) -> &[NodeId] {
        self.structure.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The file that owns the node's record.
    pub fn filename_of(&self, id: &str) -> Option<&str> {
        self.filename_by_id.get(id).map(String::as_str)
    }

    /// Document filenames, parallel to the index's proxy list.
    pub fn proxy_filenames(&self) -> &[String] {
        &self.proxy_filenames
    }

    /// Position of `filename`'s proxy record in the index.
    pub fn proxy_position(&self, filename: &str) -> Option<usize> {
        self.proxy_filenames.iter().position(|f| f == filename)
    }

    /// Forest identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.forest.keys()
    }

    /// Depth-first pre-order walk from the root, sibling order preserved.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.forest.len());
        let mut stack: Vec<&NodeId> = self.children(ROOT_ID).iter().rev().collect();
        while let Some(id) = stack.pop() {
            order.push(id.clone());
            stack.extend(self.children(id.as_str()).iter().rev());
        }
        order
    }

    /// Every node (root included) whose name lineage equals `path`
    /// element-wise. Sorted by identifier.
    pub fn name_path_matches<S: AsRef<str>>(&self, path: &[S]) -> Vec<NodeId> {
        let mut matches: Vec<NodeId> = self
            .ancestry_by_name
            .iter()
            .filter(|(_, names)| {
                names.len() == path.len()
                    && names.iter().zip(path).all(|(a, b)| a == b.as_ref())
            })
            .map(|(id, _)| id.clone())
            .collect();
        matches.sort();
        matches
    }

    /// The single node whose name lineage is exactly `path`.
    pub fn lookup_by_name_path<S: AsRef<str>>(&self, path: &[S]) -> IndexResult<NodeId> {
        let mut matches = self.name_path_matches(path);
        match matches.len() {
            0 => Err(IndexError::NoSuchNode(format!("{:?}", as_strings(path)))),
            1 => Ok(matches.remove(0)),
            _ => Err(IndexError::AmbiguousPath {
                path: as_strings(path),
                matches,
            }),
        }
    }

    // ---------------------------------------------------------------
    // Consistency
    // ---------------------------------------------------------------

    /// Describe every way the indices disagree with each other.
    pub fn consistency_findings(&self) -> Vec<String> {
        let mut findings = Vec::new();

        for id in self.forest.keys() {
            let (Some(by_id), Some(by_name)) =
                (self.ancestry_by_id.get(id), self.ancestry_by_name.get(id))
            else {
                findings.push(format!("{id}: missing ancestry"));
                continue;
            };
            if by_id.len() != by_name.len() {
                findings.push(format!(
                    "{id}: ancestry by id has {} entries, by name {}",
                    by_id.len(),
                    by_name.len()
                ));
            }
            if by_id.last() != Some(id) {
                findings.push(format!("{id}: ancestry does not end at the node"));
            }
            let parent = match by_id.len() {
                0 => None,
                1 => Some(NodeId::root()),
                n => Some(by_id[n - 2].clone()),
            };
            if let Some(parent) = parent {
                if !self.children(parent.as_str()).contains(id) {
                    findings.push(format!("{id}: not listed under parent {parent}"));
                }
            }
            if !self.filename_by_id.contains_key(id) {
                findings.push(format!("{id}: no owning file"));
            }
        }

        for (parent, children) in &self.structure {
            for child in children {
                let recorded = self.ancestry_by_id.get(child).and_then(|path| match path.len() {
                    0 => None,
                    1 => Some(NodeId::root()),
                    n => Some(path[n - 2].clone()),
                });
                if recorded.as_ref() != Some(parent) {
                    findings.push(format!("{child}: listed under {parent} but ancestry disagrees"));
                }
            }
        }

        findings.sort();
        findings
    }

    /// Fail with [`IndexError::Inconsistent`] if any finding exists.
    pub fn verify(&self) -> IndexResult<()> {
        let findings = self.consistency_findings();
        if findings.is_empty() {
            Ok(())
        } else {
            Err(IndexError::Inconsistent(findings))
        }
    }
}

fn as_strings<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter().map(|s| s.as_ref().to_string()).collect()
}
