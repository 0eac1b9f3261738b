use super::node::RawNode;
use super::{DocumentNode, NodeId, NodeType};
use crate::error::{ChunkError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Identifier given to a synthetic root when the input has none
pub const ROOT_ID: &str = "__root__";

/// Arena-backed document tree
///
/// The root always sits at index 0. Children are owned index lists in
/// reading order and the parent link is a plain index lookup.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DocumentNode>,
    index: HashMap<String, NodeId>,
    delimited: bool,
}

impl Document {
    /// Create an empty document holding only a root node
    pub fn new(metadata: Map<String, Value>) -> Self {
        let mut root = DocumentNode::new(ROOT_ID, NodeType::Root, "");
        root.metadata = metadata;

        let mut index = HashMap::new();
        index.insert(ROOT_ID.to_string(), 0);

        Self {
            nodes: vec![root],
            index,
            delimited: false,
        }
    }

    /// Append a node as the last child of `parent`
    pub fn add_node(&mut self, parent: NodeId, mut node: DocumentNode) -> Result<NodeId> {
        if parent >= self.nodes.len() {
            return Err(ChunkError::MalformedInput(format!(
                "Parent index {} out of range",
                parent
            )));
        }
        if self.index.contains_key(&node.id) {
            return Err(ChunkError::MalformedInput(format!(
                "Duplicate node id: {}",
                node.id
            )));
        }

        let id = self.nodes.len();
        node.parent = Some(parent);
        node.children.clear();
        self.index.insert(node.id.clone(), id);
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawNode = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        let raw: RawNode = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    /// Load a parsed document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.to_raw(self.root()))?)
    }

    fn from_raw(raw: RawNode) -> Result<Self> {
        let doc = if raw.kind == NodeType::Root {
            let mut doc = Self::new(Map::new());
            doc.index.clear();
            doc.index.insert(raw.id.clone(), 0);

            let root = &mut doc.nodes[0];
            root.id = raw.id;
            root.content = raw.content;
            root.geometry = raw.geom;
            root.metadata = raw.metadata;
            root.extra = raw.extra;

            for child in raw.children {
                doc.insert_raw(0, child)?;
            }
            doc
        } else {
            debug!(id = %raw.id, "document has no root node, wrapping top level");
            let mut doc = Self::new(Map::new());
            doc.insert_raw(0, raw)?;
            doc
        };

        Ok(doc)
    }

    fn insert_raw(&mut self, parent: NodeId, raw: RawNode) -> Result<()> {
        let node = DocumentNode {
            id: raw.id,
            kind: raw.kind,
            content: raw.content,
            geometry: raw.geom,
            metadata: raw.metadata,
            parent: None,
            children: Vec::new(),
            extra: raw.extra,
        };
        let id = self.add_node(parent, node)?;

        for child in raw.children {
            self.insert_raw(id, child)?;
        }
        Ok(())
    }

    fn to_raw(&self, id: NodeId) -> RawNode {
        let node = &self.nodes[id];
        RawNode {
            id: node.id.clone(),
            kind: node.kind.clone(),
            content: node.content.clone(),
            geom: node.geometry.clone(),
            metadata: node.metadata.clone(),
            children: node.children.iter().map(|&c| self.to_raw(c)).collect(),
            extra: node.extra.clone(),
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether any node besides the root exists
    pub fn has_content(&self) -> bool {
        self.nodes.len() > 1
    }

    pub fn node(&self, id: NodeId) -> &DocumentNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DocumentNode {
        &mut self.nodes[id]
    }

    /// Look up a node by its string identifier
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&DocumentNode> {
        self.find(id).map(|i| &self.nodes[i])
    }

    /// Document-level metadata (held by the root)
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.nodes[0].metadata
    }

    /// All nodes below `id` in reading order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.nodes[id].children.clone();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    /// Every non-root node in reading order
    pub fn flatten(&self) -> Descendants<'_> {
        self.descendants(self.root())
    }

    /// Highest page number referenced by any bounding box
    pub fn page_count(&self) -> u32 {
        self.nodes
            .iter()
            .flat_map(|n| n.geometry.iter())
            .map(|b| b.page)
            .max()
            .unwrap_or(0)
    }

    /// Separator appended to a node's content before chunking
    ///
    /// Cells that are not the last of their row are joined with `" | "`,
    /// nodes with children end their line, everything else ends a paragraph.
    /// Nothing is returned when the content already ends with the separator.
    pub fn delimiter_for(&self, id: NodeId) -> &'static str {
        let node = &self.nodes[id];
        if node.content.is_empty() {
            return "";
        }

        let delimiter = if node.kind == NodeType::TableCell && !self.is_last_sibling(id) {
            " | "
        } else if node.has_children() {
            "\n"
        } else {
            "\n\n"
        };

        if node.content.ends_with(delimiter) {
            ""
        } else {
            delimiter
        }
    }

    fn is_last_sibling(&self, id: NodeId) -> bool {
        match self.nodes[id].parent {
            Some(parent) => self.nodes[parent].children.last() == Some(&id),
            None => true,
        }
    }

    /// Append each node's delimiter to its content
    ///
    /// Runs at most once per document; returns false when the document was
    /// already delimited and nothing changed.
    pub fn add_delimiters(&mut self) -> bool {
        if self.delimited {
            return false;
        }

        let delimiters: Vec<&'static str> =
            (0..self.nodes.len()).map(|id| self.delimiter_for(id)).collect();
        for (node, delimiter) in self.nodes.iter_mut().zip(delimiters) {
            node.content.push_str(delimiter);
        }

        self.delimited = true;
        true
    }

    pub fn is_delimited(&self) -> bool {
        self.delimited
    }

    /// Text of a node and its whole subtree, trimmed
    pub fn subtree_text(&self, id: NodeId) -> String {
        let mut text = String::new();
        self.collect_subtree_text(id, &mut text);
        text.trim().to_string()
    }

    fn collect_subtree_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        out.push_str(&node.content);
        out.push_str(self.delimiter_for(id));

        // A row already contains the text of its cells
        if node.kind != NodeType::TableRow {
            for &child in &node.children {
                self.collect_subtree_text(child, out);
            }
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_raw(self.root()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawNode::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[id].children.iter().rev().copied());
        Some(id)
    }
}
