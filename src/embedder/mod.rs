pub mod batcher;
pub mod client;
pub mod sentence;
pub mod similarity;
pub mod types;


pub use batcher::Batcher;
pub use client::HttpEmbedder;
pub use sentence::{SentenceSplitter, UnicodeSentenceSplitter};
pub use similarity::{cosine_distance, cosine_similarity, percentile};
pub use types::{EmbeddingRequest, EmbeddingResponse};

use crate::error::Result;

/// Maps texts to dense vectors, one per input in input order
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
