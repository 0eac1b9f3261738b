use super::*;
use crate::document::{BoundingBox, Document, DocumentNode, NodeId, NodeType, TOKEN_COUNT_KEY};
use crate::embedder::{Embedder, SentenceSplitter, UnicodeSentenceSplitter};
use crate::error::ChunkError;
use crate::tokenizer::{RichToken, TokenizerAdapter, WordTokenizer};
use serde_json::{json, Map};
use std::sync::{Arc, Mutex};

fn tokenizer() -> TokenizerAdapter {
    TokenizerAdapter::new(WordTokenizer::new())
}

fn chunker(config: StrategyConfig) -> DocumentChunker {
    DocumentChunker::new(config, tokenizer()).unwrap()
}

fn fixed(max_tokens: usize, overlap: usize) -> StrategyConfig {
    StrategyConfig::FixedSize(FixedSizeConfig { max_tokens, overlap })
}

fn recursive(max_tokens: usize, overlap: usize) -> StrategyConfig {
    StrategyConfig::Recursive(RecursiveConfig { max_tokens, overlap })
}

fn hierarchical(max_tokens: usize) -> StrategyConfig {
    StrategyConfig::Hierarchical(HierarchicalConfig {
        max_tokens,
        ..Default::default()
    })
}

fn semantic(max_tokens: usize) -> StrategyConfig {
    StrategyConfig::Semantic(SemanticConfig {
        max_tokens,
        ..Default::default()
    })
}

fn add(doc: &mut Document, parent: NodeId, id: &str, kind: NodeType, content: &str) -> NodeId {
    doc.add_node(parent, DocumentNode::new(id, kind, content)).unwrap()
}

fn contents(result: &ChunkingResult) -> Vec<&str> {
    result.chunks.iter().map(|c| c.content.as_str()).collect()
}

/// Embeds any text mentioning a cat on one axis, everything else on the other
struct TopicEmbedder;

impl Embedder for TopicEmbedder {
    fn embed(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.to_lowercase().contains("cat") {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn embed(&self, _texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }
}

const ESSAY: [&str; 4] = [
    "Chunking splits long documents into pieces. Each piece stays under a budget.",
    "Paragraph breaks are the preferred place to cut; lines come next, then sentences.",
    "A very long run of plain words without any punctuation keeps going on and on until it ends",
    "Short closing note.",
];

fn essay() -> Document {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let header = add(&mut doc, root, "h", NodeType::SectionHeader, "On chunking");
    for (i, text) in ESSAY.iter().enumerate() {
        add(&mut doc, header, &format!("p{}", i), NodeType::Paragraph, text);
    }
    doc
}

/// Tokens of each chunkable node of a delimited copy of `doc`
fn stream(doc: &Document) -> Vec<Vec<RichToken>> {
    let mut doc = doc.clone();
    doc.add_delimiters();
    let adapter = tokenizer();
    doc.flatten()
        .filter(|&id| !is_excluded(&doc.node(id).kind))
        .map(|id| {
            let node = doc.node(id);
            adapter.tokenize_text(&node.id, &node.content).unwrap()
        })
        .collect()
}

// ========================================================================
// Configuration
// ========================================================================

#[test]
fn test_config_defaults() {
    let config: StrategyConfig = serde_json::from_value(json!({ "strategy": "recursive" })).unwrap();
    assert_eq!(config, recursive(128, 0));

    let config: StrategyConfig =
        serde_json::from_value(json!({ "strategy": "fixed_size", "max_tokens": 64 })).unwrap();
    assert_eq!(config, fixed(64, 32));
}

#[test]
fn test_unknown_strategy_rejected() {
    let result = serde_json::from_value::<StrategyConfig>(json!({ "strategy": "random" }));
    assert!(result.is_err());
}

#[test]
fn test_invalid_configs() {
    let invalid = vec![
        fixed(0, 0),
        fixed(4, 4),
        recursive(4, 9),
        StrategyConfig::Semantic(SemanticConfig {
            similarity_threshold_percentile: 101,
            ..Default::default()
        }),
        StrategyConfig::Hierarchical(HierarchicalConfig {
            max_parent_token_ratio: 1.0,
            ..Default::default()
        }),
        StrategyConfig::Hierarchical(HierarchicalConfig {
            max_parent_token_ratio: 0.0,
            ..Default::default()
        }),
        StrategyConfig::Hierarchical(HierarchicalConfig {
            max_parent_token_ratio: f64::NAN,
            ..Default::default()
        }),
    ];

    for config in invalid {
        assert!(
            matches!(config.validate(), Err(ChunkError::Configuration(_))),
            "{:?} should be rejected",
            config
        );
        assert!(DocumentChunker::new(config, tokenizer()).is_err());
    }
}

#[test]
fn test_parameters_and_config_dir() {
    let config = fixed(128, 32);
    assert_eq!(
        serde_json::Value::Object(config.parameters()),
        json!({ "max_tokens": 128, "overlap": 32 })
    );
    assert_eq!(config.config_dir(), "fixed_size/128_32");

    assert_eq!(
        StrategyConfig::Semantic(SemanticConfig::default()).config_dir(),
        "semantic/128_95_0"
    );
    assert_eq!(hierarchical(128).config_dir(), "hierarchical/128_0.5");

    // Key order follows the record fields, not the removal of the tag
    let keys: Vec<String> = semantic(64).parameters().keys().cloned().collect();
    assert_eq!(keys, vec!["max_tokens", "similarity_threshold_percentile", "min_tokens"]);
    let keys: Vec<String> = fixed(128, 32).parameters().keys().cloned().collect();
    assert_eq!(keys, vec!["max_tokens", "overlap"]);
}

#[test]
fn test_max_parent_tokens_floors() {
    let config = HierarchicalConfig {
        max_tokens: 9,
        max_parent_token_ratio: 0.5,
    };
    assert_eq!(config.max_parent_tokens(), 4);
}

#[test]
fn test_semantic_requires_embedder() {
    let mut doc = essay();
    let result = chunker(semantic(16)).segment(&mut doc);

    assert!(matches!(result, Err(ChunkError::Configuration(_))));
    // Nothing was touched before the error
    assert!(!doc.is_delimited());
}

// ========================================================================
// Fixed-size
// ========================================================================

#[test]
fn test_fixed_size_windows_with_overlap() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "p", NodeType::Paragraph, "The quick brown fox jumps over the lazy dog.");

    let result = chunker(fixed(4, 1)).segment(&mut doc).unwrap();

    assert_eq!(
        contents(&result),
        vec!["The quick brown fox", "fox jumps over the", "the lazy dog."]
    );
    assert!(result.chunks.iter().all(|c| c.token_len() == 4));
    assert_eq!(
        result.chunks.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
        vec!["c_0", "c_1", "c_2"]
    );
}

#[test]
fn test_fixed_size_crosses_node_boundaries() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "a", NodeType::Paragraph, "one two three");
    add(&mut doc, root, "b", NodeType::Paragraph, "four five");

    let result = chunker(fixed(4, 0)).segment(&mut doc).unwrap();

    assert_eq!(contents(&result), vec!["one two three\n\nfour", "five"]);
}

#[test]
fn test_fixed_size_coverage_and_budget() {
    let doc = essay();
    let nodes = stream(&doc);
    let all: Vec<RichToken> = nodes.concat();

    for (max_tokens, overlap) in [(5, 0), (7, 2), (16, 15), (1, 0), (200, 32)] {
        let config = FixedSizeConfig { max_tokens, overlap };
        let slices: Vec<Vec<RichToken>> = FixedSizeSlices::new(nodes.clone().into_iter(), &config).collect();

        assert!(slices.iter().all(|s| !s.is_empty() && s.len() <= max_tokens));

        let mut rebuilt = slices[0].clone();
        for pair in slices.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(next[..overlap], prev[prev.len() - overlap..]);
            rebuilt.extend_from_slice(&next[overlap..]);
        }
        assert_eq!(rebuilt, all, "max_tokens {} overlap {}", max_tokens, overlap);
    }
}

#[test]
fn test_table_rows_skipped() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let table = add(&mut doc, root, "t", NodeType::Table, "");
    let row = add(&mut doc, table, "r", NodeType::TableRow, "a | b");
    add(&mut doc, row, "c1", NodeType::TableCell, "a");
    add(&mut doc, row, "c2", NodeType::TableCell, "b");

    let result = chunker(fixed(16, 0)).segment(&mut doc).unwrap();

    assert_eq!(contents(&result), vec!["a | b"]);
    assert_eq!(result.chunks[0].token_len(), 3);
}

// ========================================================================
// Recursive
// ========================================================================

#[test]
fn test_recursive_coverage_and_budget() {
    let doc = essay();
    let nodes = stream(&doc);
    let all: Vec<RichToken> = nodes.concat();

    for max_tokens in 1..=all.len() + 1 {
        let config = RecursiveConfig { max_tokens, overlap: 0 };
        let slices: Vec<Vec<RichToken>> = RecursiveSlices::new(nodes.clone().into_iter(), &config).collect();

        assert!(
            slices.iter().all(|s| !s.is_empty() && s.len() <= max_tokens),
            "budget {} violated",
            max_tokens
        );
        assert_eq!(slices.concat(), all, "budget {} lost tokens", max_tokens);
    }
}

#[test]
fn test_recursive_overlap_stays_in_budget() {
    let doc = essay();
    let nodes = stream(&doc);

    for (max_tokens, overlap) in [(6, 2), (10, 9), (12, 4)] {
        let config = RecursiveConfig { max_tokens, overlap };
        let slices: Vec<Vec<RichToken>> = RecursiveSlices::new(nodes.clone().into_iter(), &config).collect();

        assert!(slices.iter().all(|s| !s.is_empty() && s.len() <= max_tokens));
        // The last token of the document always ends the last slice
        assert_eq!(slices.last().unwrap().last(), nodes.concat().last());
    }
}

#[test]
fn test_recursive_prefers_paragraphs() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "a", NodeType::Paragraph, "one two three.");
    add(&mut doc, root, "b", NodeType::Paragraph, "four five six.");
    add(&mut doc, root, "c", NodeType::Paragraph, "seven eight nine.");

    let result = chunker(recursive(8, 0)).segment(&mut doc).unwrap();

    assert_eq!(
        contents(&result),
        vec!["one two three.\n\nfour five six.", "seven eight nine."]
    );
}

// ========================================================================
// Semantic
// ========================================================================

fn topics() -> Document {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(
        &mut doc,
        root,
        "p",
        NodeType::Paragraph,
        "The cat sat. The cat slept. Stocks fell. Markets dropped.",
    );
    doc
}

#[test]
fn test_semantic_breaks_on_topic_change() {
    let mut doc = topics();
    let result = chunker(semantic(8))
        .with_embedder(TopicEmbedder)
        .segment(&mut doc)
        .unwrap();

    assert_eq!(
        contents(&result),
        vec!["The cat sat. The cat slept.", "Stocks fell. Markets dropped."]
    );
}

#[test]
fn test_semantic_merges_while_budget_allows() {
    let mut doc = topics();
    let result = chunker(semantic(128))
        .with_embedder(TopicEmbedder)
        .segment(&mut doc)
        .unwrap();

    assert_eq!(result.chunks.len(), 1);
    assert_eq!(result.chunks[0].token_len(), 14);
}

#[test]
fn test_semantic_single_sentence() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "p", NodeType::Paragraph, "Only one sentence lives here.");

    let result = chunker(semantic(32))
        .with_embedder(TopicEmbedder)
        .segment(&mut doc)
        .unwrap();

    assert_eq!(contents(&result), vec!["Only one sentence lives here."]);
}

#[test]
fn test_semantic_oversized_residual_is_split() {
    let mut doc = essay();
    let result = chunker(semantic(6))
        .with_embedder(TopicEmbedder)
        .segment(&mut doc)
        .unwrap();

    assert!(result.chunks.iter().all(|c| c.token_len() <= 6));
    let total: usize = result.chunks.iter().map(Chunk::token_len).sum();
    let expected: usize = stream(&essay()).iter().map(Vec::len).sum();
    assert_eq!(total, expected);
}

#[test]
fn test_semantic_min_tokens_keeps_budget_and_coverage() {
    let expected: usize = stream(&essay()).iter().map(Vec::len).sum();

    for (max_tokens, min_tokens) in [(6, 3), (8, 20), (5, 5)] {
        let config = StrategyConfig::Semantic(SemanticConfig {
            max_tokens,
            min_tokens,
            ..Default::default()
        });
        let mut doc = essay();
        let result = chunker(config)
            .with_embedder(TopicEmbedder)
            .segment(&mut doc)
            .unwrap();

        assert!(
            result.chunks.iter().all(|c| c.token_len() <= max_tokens),
            "budget {} exceeded with min {}",
            max_tokens,
            min_tokens
        );
        let total: usize = result.chunks.iter().map(Chunk::token_len).sum();
        assert_eq!(total, expected);
        assert_eq!(result.metadata["min_tokens"], min_tokens);
    }
}

/// Delegates to UAX #29 and remembers what it was asked to split
struct RecordingSplitter(Arc<Mutex<Vec<String>>>);

impl SentenceSplitter for RecordingSplitter {
    fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.0.lock().unwrap().push(text.to_string());
        UnicodeSentenceSplitter.split(text)
    }
}

#[test]
fn test_semantic_uses_configured_sentence_splitter() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut doc = topics();
    let result = chunker(semantic(8))
        .with_embedder(TopicEmbedder)
        .with_sentence_splitter(RecordingSplitter(Arc::clone(&seen)))
        .segment(&mut doc)
        .unwrap();

    assert_eq!(result.chunks.len(), 2);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("The cat sat."));
}

#[test]
fn test_semantic_embedder_mismatch() {
    let mut doc = topics();
    let result = chunker(semantic(8))
        .with_embedder(BrokenEmbedder)
        .segment(&mut doc);

    assert!(matches!(result, Err(ChunkError::MalformedInput(_))));
}

// ========================================================================
// Hierarchical
// ========================================================================

#[test]
fn test_hierarchical_prefixes_header_and_keeps_children_apart() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let header = add(&mut doc, root, "h", NodeType::SectionHeader, "Introduction");
    add(&mut doc, header, "p1", NodeType::Paragraph, "alpha beta gamma delta");
    add(&mut doc, header, "p2", NodeType::Paragraph, "one two three four");

    let result = chunker(hierarchical(8)).segment(&mut doc).unwrap();

    assert_eq!(
        contents(&result),
        vec!["Introduction\nalpha beta gamma delta", "Introduction\none two three four"]
    );
}

#[test]
fn test_hierarchical_whole_subtree_when_it_fits() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let header = add(&mut doc, root, "h", NodeType::SectionHeader, "Introduction");
    add(&mut doc, header, "p1", NodeType::Paragraph, "alpha beta gamma delta");
    add(&mut doc, header, "p2", NodeType::Paragraph, "one two three four");

    let result = chunker(hierarchical(10)).segment(&mut doc).unwrap();

    assert_eq!(result.chunks.len(), 1);
    assert_eq!(result.chunks[0].token_len(), 9);
}

#[test]
fn test_hierarchical_chains_unsplit_siblings() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let header = add(&mut doc, root, "h", NodeType::SectionHeader, "Title");
    add(&mut doc, header, "a", NodeType::Paragraph, "one two");
    add(&mut doc, header, "b", NodeType::Paragraph, "three four");
    add(&mut doc, header, "c", NodeType::Paragraph, "five six");
    add(&mut doc, header, "d", NodeType::Paragraph, "seven eight nine ten eleven twelve");

    let result = chunker(hierarchical(8)).segment(&mut doc).unwrap();

    assert_eq!(
        contents(&result),
        vec![
            "Title\none two\n\nthree four\n\nfive six",
            "Title\nseven eight nine ten eleven twelve"
        ]
    );
}

#[test]
fn test_hierarchical_splits_long_leaf() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "p", NodeType::Paragraph, ESSAY[2]);

    let result = chunker(hierarchical(8)).segment(&mut doc).unwrap();

    assert!(result.chunks.len() > 1);
    assert!(result.chunks.iter().all(|c| c.token_len() <= 8));
}

#[test]
fn test_hierarchical_drops_expensive_header() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let header = add(&mut doc, root, "h", NodeType::SectionHeader, "a b c d e f");
    add(&mut doc, header, "p", NodeType::Paragraph, "one two three four five six seven");

    let result = chunker(hierarchical(8)).segment(&mut doc).unwrap();

    assert_eq!(contents(&result), vec!["one two three four five six seven"]);
}

#[test]
fn test_hierarchical_fitting_subtree_includes_grandchildren() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let list = add(&mut doc, root, "l", NodeType::List, "");
    let item = add(&mut doc, list, "i1", NodeType::ListItem, "first");
    add(&mut doc, item, "i1a", NodeType::ListItem, "nested");

    let result = chunker(hierarchical(8)).segment(&mut doc).unwrap();

    assert_eq!(contents(&result), vec!["first\nnested"]);
}

// ========================================================================
// Façade
// ========================================================================

#[test]
fn test_empty_document() {
    let mut doc = Document::new(Map::new());
    let result = chunker(fixed(8, 0)).segment(&mut doc);
    assert!(matches!(result, Err(ChunkError::EmptyDocument)));

    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "p", NodeType::Paragraph, "   ");
    let result = chunker(recursive(8, 0)).segment(&mut doc);
    assert!(matches!(result, Err(ChunkError::EmptyDocument)));
}

#[test]
fn test_result_metadata() {
    let mut metadata = Map::new();
    metadata.insert("file_path".to_string(), json!("doc.pdf"));
    let mut doc = Document::new(metadata);
    let root = doc.root();
    add(&mut doc, root, "p", NodeType::Paragraph, "The quick brown fox jumps over the lazy dog.");

    let result = chunker(fixed(4, 1)).segment(&mut doc).unwrap();
    let meta = &result.metadata;

    assert_eq!(meta["file_path"], "doc.pdf");
    assert_eq!(meta["strategy"], "fixed_size");
    assert_eq!(meta["max_tokens"], 4);
    assert_eq!(meta["overlap"], 1);
    assert_eq!(meta["tokenizer"], "word");
    assert_eq!(meta["chunk_count"], 3);
    assert_eq!(meta["chunk_length_mean"], 4.0);
    assert_eq!(meta["chunk_length_std"], 0.0);
    assert_eq!(meta["chunk_length_median"], 4.0);
    assert!(!meta.contains_key(TOKEN_COUNT_KEY));
}

#[test]
fn test_length_statistics() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    add(&mut doc, root, "p", NodeType::Paragraph, "one two three four five six seven");

    // Windows of 3 tokens, each sharing one with the previous
    let result = chunker(fixed(3, 1)).segment(&mut doc).unwrap();
    let lengths: Vec<usize> = result.chunks.iter().map(Chunk::token_len).collect();
    assert_eq!(lengths, vec![3, 3, 3]);

    let result = chunker(fixed(3, 0)).segment(&mut doc).unwrap();
    let lengths: Vec<usize> = result.chunks.iter().map(Chunk::token_len).collect();
    assert_eq!(lengths, vec![3, 3, 1]);
    assert_eq!(result.metadata["chunk_length_mean"], 2.3333);
    assert_eq!(result.metadata["chunk_length_std"], 0.9428);
    assert_eq!(result.metadata["chunk_length_median"], 3.0);
}

#[test]
fn test_segment_is_deterministic_and_delimits_once() {
    for config in [fixed(6, 2), recursive(6, 0), semantic(6), hierarchical(12)] {
        // The embedder is only consulted by the semantic strategy
        let build = || chunker(config.clone()).with_embedder(TopicEmbedder);
        let mut doc = essay();
        let first = build().segment(&mut doc).unwrap();
        let again = build().segment(&mut doc).unwrap();
        let fresh = build().segment(&mut essay()).unwrap();

        assert_eq!(first, again);
        assert_eq!(first.to_json_pretty().unwrap(), fresh.to_json_pretty().unwrap());
    }
}

#[test]
fn test_token_counts_recorded() {
    let mut doc = essay();
    chunker(fixed(16, 0)).segment(&mut doc).unwrap();

    assert_eq!(doc.get("h").unwrap().token_count(), Some(2));
    assert_eq!(doc.get("p3").unwrap().token_count(), Some(4));
}

#[test]
fn test_chunk_geometry_is_contained() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    for (i, text) in ESSAY.iter().enumerate() {
        let page = i as u32 / 2 + 1;
        let top = 0.1 + (i % 2) as f64 * 0.4;
        let spans = (0..3)
            .map(|l| {
                let t = top + l as f64 * 0.1;
                BoundingBox::new(page, 0.1, t, 0.9, t + 0.1)
            })
            .collect();
        let bbox = BoundingBox::new(page, 0.1, top, 0.9, top + 0.3).with_spans(spans);
        let node = DocumentNode::new(format!("p{}", i), NodeType::Paragraph, *text)
            .with_geometry(vec![bbox]);
        doc.add_node(root, node).unwrap();
    }
    let pages = doc.page_count();

    for config in [fixed(5, 1), recursive(7, 0), hierarchical(9)] {
        let result = chunker(config).segment(&mut doc.clone()).unwrap();

        for chunk in &result.chunks {
            assert!(!chunk.geometry.is_empty(), "{} has no geometry", chunk.id);
            for bbox in &chunk.geometry {
                assert!(bbox.is_well_formed(), "{:?}", bbox);
                assert!(bbox.page <= pages);
                assert!(bbox.spans.is_empty());
            }
        }
    }
}

#[test]
fn test_without_geometry() {
    let mut doc = essay();
    let result = chunker(fixed(8, 0))
        .with_geometry(false)
        .segment(&mut doc)
        .unwrap();

    assert!(result.chunks.iter().all(|c| c.geometry.is_empty()));
}

#[test]
fn test_result_json_shape() {
    let mut doc = Document::new(Map::new());
    let root = doc.root();
    let node = DocumentNode::new("p", NodeType::Paragraph, "Hello world")
        .with_geometry(vec![BoundingBox::new(1, 0.1, 0.2, 0.3, 0.4)]);
    doc.add_node(root, node).unwrap();

    let result = chunker(fixed(8, 0)).segment(&mut doc).unwrap();
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(
        value["chunks"][0],
        json!({
            "id": "c_0",
            "content": "Hello world",
            "metadata": { "token_len": 2 },
            "geom": [{ "page": 1, "l": 0.1, "t": 0.2, "r": 0.3, "b": 0.4 }]
        })
    );
}
