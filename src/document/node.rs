use super::{BoundingBox, NodeType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Index of a node inside its document arena
pub type NodeId = usize;

/// Metadata key under which the tokenizer records a node's token count
pub const TOKEN_COUNT_KEY: &str = "token_cnt";

/// A typed content node of a parsed document
#[derive(Debug, Clone)]
pub struct DocumentNode {
    /// Identifier, unique within the document
    pub id: String,
    pub kind: NodeType,
    pub content: String,
    /// Page regions covered by this node, in reading order
    pub geometry: Vec<BoundingBox>,
    pub metadata: Map<String, Value>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) extra: Map<String, Value>,
}

impl DocumentNode {
    pub fn new(id: impl Into<String>, kind: NodeType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            geometry: Vec::new(),
            metadata: Map::new(),
            parent: None,
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Vec<BoundingBox>) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn geom_count(&self) -> usize {
        self.geometry.len()
    }

    /// Token count written by the last tokenization of this node
    pub fn token_count(&self) -> Option<usize> {
        self.metadata
            .get(TOKEN_COUNT_KEY)
            .and_then(Value::as_u64)
            .map(|n| n as usize)
    }

    pub fn set_token_count(&mut self, count: usize) {
        self.metadata
            .insert(TOKEN_COUNT_KEY.to_string(), Value::from(count as u64));
    }

    /// Tokens owned by each bounding box, assuming uniform density across boxes
    pub fn tokens_per_geom(&self) -> Option<f64> {
        if self.geometry.is_empty() {
            return None;
        }
        self.token_count()
            .map(|count| count as f64 / self.geometry.len() as f64)
    }
}

/// Nested wire representation of a node, as exchanged with the parsing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub geom: Vec<BoundingBox>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
