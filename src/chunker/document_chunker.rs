use super::config::StrategyConfig;
use super::fixed::FixedSizeSlices;
use super::hierarchical::HierarchicalChunker;
use super::recursive::RecursiveSlices;
use super::semantic::SemanticChunker;
use super::types::{Chunk, ChunkingResult};
use crate::document::{Document, NodeId, NodeType};
use crate::embedder::{Embedder, SentenceSplitter, UnicodeSentenceSplitter};
use crate::error::{ChunkError, Result};
use crate::geometry::get_chunk;
use crate::tokenizer::{RichToken, TokenizerAdapter};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Node types skipped by the queue-based strategies
///
/// A table row repeats the text of its cells, which are visited anyway.
pub fn is_excluded(kind: &NodeType) -> bool {
    matches!(kind, NodeType::TableRow)
}

/// Turns documents into chunks with one configured strategy
pub struct DocumentChunker {
    config: StrategyConfig,
    tokenizer: TokenizerAdapter,
    sentences: Arc<dyn SentenceSplitter>,
    embedder: Option<Arc<dyn Embedder>>,
    with_geom: bool,
}

impl DocumentChunker {
    /// Fails with a configuration error on invalid strategy parameters
    pub fn new(config: StrategyConfig, tokenizer: TokenizerAdapter) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            tokenizer,
            sentences: Arc::new(UnicodeSentenceSplitter),
            embedder: None,
            with_geom: true,
        })
    }

    pub fn with_embedder(self, embedder: impl Embedder + 'static) -> Self {
        self.with_shared_embedder(Arc::new(embedder))
    }

    pub fn with_shared_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_sentence_splitter(mut self, splitter: impl SentenceSplitter + 'static) -> Self {
        self.sentences = Arc::new(splitter);
        self
    }

    /// Whether chunks carry reconstructed geometry (default: true)
    pub fn with_geometry(mut self, with_geom: bool) -> Self {
        self.with_geom = with_geom;
        self
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &TokenizerAdapter {
        &self.tokenizer
    }

    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;

        if matches!(self.config, StrategyConfig::Semantic(_)) && self.embedder.is_none() {
            return Err(ChunkError::Configuration(
                "the semantic strategy needs an embedder".to_string(),
            ));
        }

        Ok(())
    }

    /// Chunk a document
    ///
    /// Appends delimiters to the node contents unless that already happened,
    /// and records each visited node's token count in its metadata. Slices
    /// holding only whitespace are dropped. Fails with
    /// [`ChunkError::EmptyDocument`] when nothing is left.
    pub fn segment(&self, doc: &mut Document) -> Result<ChunkingResult> {
        self.validate()?;
        if !doc.has_content() {
            return Err(ChunkError::EmptyDocument);
        }

        if !doc.add_delimiters() {
            debug!("document already delimited");
        }

        let slices = self.chunk_tokens(doc)?;
        let doc: &Document = doc;

        let chunks: Vec<Chunk> = slices
            .iter()
            .filter(|slice| !slice.iter().all(RichToken::is_blank))
            .enumerate()
            .map(|(index, slice)| get_chunk(slice, index, doc, self.with_geom))
            .collect();

        if chunks.is_empty() {
            return Err(ChunkError::EmptyDocument);
        }

        let mut metadata = doc.metadata().clone();
        metadata.insert("strategy".to_string(), Value::from(self.config.name()));
        metadata.extend(self.config.parameters());
        metadata.insert("tokenizer".to_string(), Value::from(self.tokenizer.name()));
        add_statistics(&mut metadata, &chunks);

        info!(
            strategy = self.config.name(),
            chunks = chunks.len(),
            "segmented document"
        );

        Ok(ChunkingResult { metadata, chunks })
    }

    /// Token slices, one per chunk, in document order
    fn chunk_tokens(&self, doc: &mut Document) -> Result<Vec<Vec<RichToken>>> {
        match &self.config {
            StrategyConfig::FixedSize(config) => {
                let nodes = self.node_tokens(doc)?;
                Ok(FixedSizeSlices::new(nodes.into_iter(), config).collect())
            }
            StrategyConfig::Recursive(config) => {
                let nodes = self.node_tokens(doc)?;
                Ok(RecursiveSlices::new(nodes.into_iter(), config).collect())
            }
            StrategyConfig::Semantic(config) => {
                let embedder = self.embedder.as_deref().ok_or_else(|| {
                    ChunkError::Configuration("the semantic strategy needs an embedder".to_string())
                })?;
                let nodes = chunkable_nodes(doc);

                SemanticChunker {
                    tokenizer: &self.tokenizer,
                    sentences: self.sentences.as_ref(),
                    embedder,
                    config,
                }
                .chunk_tokens(doc, &nodes)
            }
            StrategyConfig::Hierarchical(config) => HierarchicalChunker {
                tokenizer: &self.tokenizer,
                config,
            }
            .chunk_tokens(doc),
        }
    }

    /// Tokens of every chunkable node in reading order
    fn node_tokens(&self, doc: &mut Document) -> Result<Vec<Vec<RichToken>>> {
        chunkable_nodes(doc)
            .into_iter()
            .map(|id| self.tokenizer.tokenize(doc.node_mut(id)))
            .collect()
    }
}

fn chunkable_nodes(doc: &Document) -> Vec<NodeId> {
    doc.flatten()
        .filter(|&id| !is_excluded(&doc.node(id).kind))
        .collect()
}

/// Chunk count and token length mean / std / median, rounded to 4 places
fn add_statistics(metadata: &mut Map<String, Value>, chunks: &[Chunk]) {
    let mut lengths: Vec<f64> = chunks.iter().map(|c| c.token_len() as f64).collect();
    lengths.sort_by(|a, b| a.total_cmp(b));

    let count = lengths.len() as f64;
    let mean = lengths.iter().sum::<f64>() / count;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / count;
    let mid = lengths.len() / 2;
    let median = if lengths.len() % 2 == 0 {
        (lengths[mid - 1] + lengths[mid]) / 2.0
    } else {
        lengths[mid]
    };

    metadata.insert("chunk_count".to_string(), Value::from(chunks.len() as u64));
    metadata.insert("chunk_length_mean".to_string(), Value::from(round4(mean)));
    metadata.insert("chunk_length_std".to_string(), Value::from(round4(variance.sqrt())));
    metadata.insert("chunk_length_median".to_string(), Value::from(round4(median)));
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
