use super::config::SemanticConfig;
use crate::document::{Document, NodeId};
use crate::embedder::{cosine_distance, percentile, Embedder, SentenceSplitter};
use crate::error::{ChunkError, Result};
use crate::splitter::{find_splits, slice_at};
use crate::tokenizer::{join_text, RichToken, TokenizerAdapter};
use tracing::debug;

/// Sentence-level tokens with the distance to the preceding sentence
struct Sentence {
    tokens: Vec<RichToken>,
    distance: f32,
}

pub(crate) struct SemanticChunker<'a> {
    pub tokenizer: &'a TokenizerAdapter,
    pub sentences: &'a dyn SentenceSplitter,
    pub embedder: &'a dyn Embedder,
    pub config: &'a SemanticConfig,
}

impl SemanticChunker<'_> {
    pub fn chunk_tokens(&self, doc: &mut Document, nodes: &[NodeId]) -> Result<Vec<Vec<RichToken>>> {
        let sentences = self.embed_sentences(doc, nodes)?;
        Ok(self.group(sentences))
    }

    /// Tokenize every node, cut its tokens at sentence boundaries and score
    /// each sentence against the one before it
    fn embed_sentences(&self, doc: &mut Document, nodes: &[NodeId]) -> Result<Vec<Sentence>> {
        let mut groups: Vec<Vec<RichToken>> = Vec::new();

        for &id in nodes {
            if doc.node(id).content.trim().is_empty() {
                continue;
            }

            let tokens = self.tokenizer.tokenize(doc.node_mut(id))?;
            let bounds = sentence_ends(self.sentences.split(&doc.node(id).content));
            groups.extend(align_tokens(tokens, &bounds));
        }

        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = groups.iter().map(|g| join_text(g)).collect();
        let embeddings = self.embedder.embed(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(ChunkError::collaborator(
                "embedder",
                format!("{} vectors for {} sentences", embeddings.len(), texts.len()),
            ));
        }

        let mut sentences = Vec::with_capacity(groups.len());
        for (i, tokens) in groups.into_iter().enumerate() {
            let distance = match i {
                0 => 0.0,
                _ => cosine_distance(&embeddings[i - 1], &embeddings[i]),
            };
            sentences.push(Sentence { tokens, distance });
        }

        debug!(sentences = sentences.len(), "embedded sentences");
        Ok(sentences)
    }

    /// Merge sentences into chunks, breaking where the distance reaches the
    /// configured percentile
    fn group(&self, sentences: Vec<Sentence>) -> Vec<Vec<RichToken>> {
        let distances: Vec<f32> = sentences.iter().map(|s| s.distance).collect();
        let q = self.config.similarity_threshold_percentile as f64;
        let Some(threshold) = percentile(&distances, q) else {
            return Vec::new();
        };

        let max_tokens = self.config.max_tokens.max(1);
        let mut out = Vec::new();
        let mut chunk: Vec<RichToken> = Vec::new();
        let mut span: Vec<RichToken> = Vec::new();

        for (i, sentence) in sentences.into_iter().enumerate() {
            if i > 0 && sentence.distance >= threshold {
                self.close_span(&mut out, &mut chunk, std::mem::take(&mut span), max_tokens);
            }
            span.extend(sentence.tokens);
        }
        self.close_span(&mut out, &mut chunk, span, max_tokens);

        if chunk.len() <= max_tokens {
            out.push(chunk);
        } else {
            out.extend(slice_at(&chunk, &find_splits(&chunk, max_tokens)));
        }

        out.retain(|c| !c.is_empty());
        out
    }

    fn close_span(
        &self,
        out: &mut Vec<Vec<RichToken>>,
        chunk: &mut Vec<RichToken>,
        span: Vec<RichToken>,
        max_tokens: usize,
    ) {
        let fits = chunk.len() + span.len() <= max_tokens;
        if !fits && !chunk.is_empty() && chunk.len() >= self.config.min_tokens {
            if chunk.len() <= max_tokens {
                out.push(std::mem::take(chunk));
            } else {
                // Oversized: emit all but the last segment, which keeps growing
                let mut splits = find_splits(chunk, max_tokens);
                splits.pop();
                let last = splits.last().copied().unwrap_or(0);
                out.extend(slice_at(chunk, &splits));
                chunk.drain(..last);
            }
        }

        chunk.extend(span);
    }
}

/// Byte offsets where each sentence ends
fn sentence_ends(sentences: Vec<&str>) -> Vec<usize> {
    sentences
        .iter()
        .scan(0, |end, s| {
            *end += s.len();
            Some(*end)
        })
        .collect()
}

/// Group a node's tokens by the sentence holding each token's first byte
fn align_tokens(tokens: Vec<RichToken>, sentence_ends: &[usize]) -> Vec<Vec<RichToken>> {
    let mut groups: Vec<Vec<RichToken>> = vec![Vec::new()];
    let mut sentence = 0;
    let mut offset = 0;

    for token in tokens {
        while sentence + 1 < sentence_ends.len() && offset >= sentence_ends[sentence] {
            sentence += 1;
            groups.push(Vec::new());
        }

        offset += token.text.len();
        if let Some(group) = groups.last_mut() {
            group.push(token);
        }
    }

    groups.retain(|g| !g.is_empty());
    groups
}
