mod config;
mod document_chunker;
mod fixed;
mod hierarchical;
mod recursive;
mod semantic;
mod types;

#[cfg(test)]
mod tests;

pub use config::{
    FixedSizeConfig, HierarchicalConfig, RecursiveConfig, SemanticConfig, StrategyConfig,
    DEFAULT_MAX_TOKENS,
};
pub use document_chunker::{is_excluded, DocumentChunker};
pub use fixed::FixedSizeSlices;
pub use recursive::RecursiveSlices;
pub use types::{Chunk, ChunkingResult, TOKEN_LEN_KEY};
