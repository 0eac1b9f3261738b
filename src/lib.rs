// Public API exports
pub mod chunker;
pub mod document;
pub mod embedder;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod splitter;
pub mod tokenizer;

// Re-export main types for convenience
pub use error::{ChunkError, Result};

pub use document::{BoundingBox, Document, DocumentNode, NodeId, NodeType};

pub use tokenizer::{HfTokenizer, RichToken, TokenizerAdapter, TokenizerBackend, WordTokenizer};

pub use splitter::{find_splits, find_splits_with};

pub use geometry::get_chunk;

pub use chunker::{
    Chunk, ChunkingResult, DocumentChunker, FixedSizeConfig, HierarchicalConfig, RecursiveConfig,
    SemanticConfig, StrategyConfig,
};

pub use embedder::{Embedder, HttpEmbedder, SentenceSplitter, UnicodeSentenceSplitter};

pub use pipeline::{process_batch, process_document, BatchReport};
