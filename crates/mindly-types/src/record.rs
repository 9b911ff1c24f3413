//! Serde models of the two Mindly file kinds.
//!
//! Field names follow the application's camelCase JSON. Every record keeps
//! fields it does not model in a flattened `extra` map, so a load followed by
//! a write never drops data the application relies on.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::NodeId;

/// Pseudo-filename under which the index payload is stored.
pub const INDEX_FILENAME: &str = "mindly.index";
/// Only index `fileFormatVersion` this crate understands.
pub const INDEX_FORMAT_VERSION: u32 = 2;
/// Only document `fileFormatVersion` this crate understands.
pub const DOCUMENT_FORMAT_VERSION: u32 = 4;
/// Extension given to newly created document files.
pub const DOCUMENT_EXTENSION: &str = "mndl";

pub const DEFAULT_COLOR: &str = "blue0";
pub const DEFAULT_IDEA_TYPE: i64 = 1;
pub const DEFAULT_COLOR_THEME_TYPE: i64 = 0;

// ---------------------------------------------------------------
// Index file
// ---------------------------------------------------------------

/// Contents of `mindly.index`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPayload {
    pub file_format_version: u32,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
    #[serde(default)]
    pub proxies: Vec<ProxyRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexPayload {
    /// An index with no sections and no documents.
    pub fn empty() -> Self {
        Self {
            file_format_version: INDEX_FORMAT_VERSION,
            sections: Vec::new(),
            proxies: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl Default for IndexPayload {
    fn default() -> Self {
        Self::empty()
    }
}

/// Top-level grouping node. Lives entirely inside the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub identifier: NodeId,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SectionRecord {
    pub fn new(identifier: NodeId, text: impl Into<String>) -> Self {
        Self {
            identifier,
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// The index's summary of one document file.
///
/// Shares `identifier` and `text` with the document's root idea.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRecord {
    pub identifier: NodeId,
    #[serde(default)]
    pub text: String,
    /// Identifier of the owning section.
    #[serde(default)]
    pub section: String,
    pub filename: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_modified: String,
    /// Number of ideas in the document, root idea included.
    #[serde(default)]
    pub item_count: u64,
    #[serde(default)]
    pub has_note: bool,
    #[serde(default)]
    pub has_web_link: bool,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl ProxyRecord {
    /// A proxy for a freshly created, single-idea document.
    pub fn new(
        identifier: NodeId,
        text: impl Into<String>,
        section: &NodeId,
        filename: impl Into<String>,
        created: &str,
    ) -> Self {
        Self {
            identifier,
            text: text.into(),
            section: section.to_string(),
            filename: filename.into(),
            date_created: created.to_string(),
            date_modified: created.to_string(),
            item_count: 1,
            has_note: false,
            has_web_link: false,
            color: default_color(),
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------
// Document files
// ---------------------------------------------------------------

/// Contents of one `.mndl` document, inside its envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub file_format_version: u32,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub date_modified: String,
    /// The document's root idea.
    pub idea: IdeaRecord,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for DocumentPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = DocumentPayload;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a document object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut version: Option<u32> = None;
        let mut date_created: Option<String> = None;
        let mut date_modified: Option<String> = None;
        let mut idea: Option<IdeaRecord> = None;
        let mut extra = Map::new();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "fileFormatVersion" => version = Some(map.next_value()?),
                "dateCreated" => date_created = Some(map.next_value()?),
                "dateModified" => date_modified = Some(map.next_value()?),
                "idea" => idea = Some(map.next_value()?),
                _ => {
                    let value = map.next_value::<Value>()?;
                    extra.insert(key, value);
                }
            }
        }

        Ok(DocumentPayload {
            file_format_version: version
                .ok_or_else(|| de::Error::missing_field("fileFormatVersion"))?,
            date_created: date_created.unwrap_or_default(),
            date_modified: date_modified.unwrap_or_default(),
            idea: idea.ok_or_else(|| de::Error::missing_field("idea"))?,
            extra,
        })
    }
}

impl DocumentPayload {
    /// A new document created at `created`, holding `idea` as its root.
    pub fn new(idea: IdeaRecord, created: &str) -> Self {
        Self {
            file_format_version: DOCUMENT_FORMAT_VERSION,
            date_created: created.to_string(),
            date_modified: created.to_string(),
            idea,
            extra: Map::new(),
        }
    }
}

/// One node of a document's idea tree.
///
/// An optional field the file carries as `null`, or with an unexpected
/// type, stays in `extra` untouched and is written back as it was read.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaRecord {
    pub identifier: NodeId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_theme_type: Option<i64>,
    /// Child ideas in display order. `None` when the file carries no list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideas: Option<Vec<IdeaRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Hand-written so child lists are read straight from the source map rather
// than buffered, keeping each nesting level inside the caller's deserializer.
impl<'de> Deserialize<'de> for IdeaRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(IdeaVisitor)
    }
}

struct IdeaVisitor;

impl<'de> Visitor<'de> for IdeaVisitor {
    type Value = IdeaRecord;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an idea object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut identifier: Option<NodeId> = None;
        let mut text: Option<String> = None;
        let mut ideas: Option<Vec<IdeaRecord>> = None;
        let mut extra = Map::new();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "identifier" => {
                    if identifier.is_some() {
                        return Err(de::Error::duplicate_field("identifier"));
                    }
                    identifier = Some(map.next_value()?);
                }
                "text" => {
                    if text.is_some() {
                        return Err(de::Error::duplicate_field("text"));
                    }
                    text = Some(map.next_value()?);
                }
                "ideas" => match map.next_value::<Option<Vec<IdeaRecord>>>()? {
                    Some(list) => ideas = Some(list),
                    None => {
                        extra.insert(key, Value::Null);
                    }
                },
                _ => {
                    let value = map.next_value::<Value>()?;
                    extra.insert(key, value);
                }
            }
        }

        let identifier = identifier.ok_or_else(|| de::Error::missing_field("identifier"))?;
        Ok(IdeaRecord {
            identifier,
            text: text.unwrap_or_default(),
            note: lift(&mut extra, "note", |v| v.as_str().map(str::to_string)),
            idea_type: lift(&mut extra, "ideaType", Value::as_i64),
            color: lift(&mut extra, "color", |v| v.as_str().map(str::to_string)),
            color_theme_type: lift(&mut extra, "colorThemeType", Value::as_i64),
            ideas,
            extra,
        })
    }
}

/// Remove `key` from `extra` when `read` accepts its value.
fn lift<T>(extra: &mut Map<String, Value>, key: &str, read: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let value = extra.get(key).and_then(read)?;
    extra.remove(key);
    Some(value)
}

impl IdeaRecord {
    /// A bare idea with only identifier and text set.
    pub fn new(identifier: NodeId, text: impl Into<String>) -> Self {
        Self {
            identifier,
            text: text.into(),
            note: None,
            idea_type: None,
            color: None,
            color_theme_type: None,
            ideas: None,
            extra: Map::new(),
        }
    }

    /// A document root idea with Mindly's defaults filled in.
    ///
    /// Empty `note` or `color` arguments keep the default.
    pub fn document_root(identifier: NodeId, text: impl Into<String>, note: &str, color: &str) -> Self {
        Self {
            note: Some(note.to_string()),
            idea_type: Some(DEFAULT_IDEA_TYPE),
            color: Some(if color.is_empty() { DEFAULT_COLOR } else { color }.to_string()),
            color_theme_type: Some(DEFAULT_COLOR_THEME_TYPE),
            ..Self::new(identifier, text)
        }
    }

    /// Child ideas, empty when the list is absent.
    pub fn children(&self) -> &[IdeaRecord] {
        self.ideas.as_deref().unwrap_or_default()
    }

    /// Append a child, creating the list if absent. Returns its position.
    pub fn push_child(&mut self, child: IdeaRecord) -> usize {
        if self.ideas.is_none() {
            self.extra.remove("ideas");
        }
        let ideas = self.ideas.get_or_insert_with(Vec::new);
        ideas.push(child);
        ideas.len() - 1
    }

    /// Number of ideas in this subtree, this one included.
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(IdeaRecord::subtree_len).sum::<usize>()
    }

    /// Follow child positions down from this idea.
    pub fn at_route(&self, route: &[usize]) -> Option<&IdeaRecord> {
        route
            .iter()
            .try_fold(self, |idea, &pos| idea.children().get(pos))
    }

    /// Mutable variant of [`IdeaRecord::at_route`].
    pub fn at_route_mut(&mut self, route: &[usize]) -> Option<&mut IdeaRecord> {
        let mut idea = self;
        for &pos in route {
            idea = idea.ideas.as_mut()?.get_mut(pos)?;
        }
        Some(idea)
    }
}
