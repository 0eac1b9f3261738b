use crate::document::BoundingBox;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding a chunk's token count
pub const TOKEN_LEN_KEY: &str = "token_len";

/// A token-bounded piece of output text with its source geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    #[serde(rename = "geom")]
    pub geometry: Vec<BoundingBox>,
}

impl Chunk {
    pub fn token_len(&self) -> usize {
        self.metadata
            .get(TOKEN_LEN_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize
    }
}

/// All chunks of one document plus run metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub metadata: Map<String, Value>,
    pub chunks: Vec<Chunk>,
}

impl ChunkingResult {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
