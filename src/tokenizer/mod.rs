mod backend;
mod hf;
mod token;
mod word;


pub use backend::{EncodedToken, TokenizerBackend};
pub use hf::HfTokenizer;
pub use token::{join_text, RichToken};
pub use word::WordTokenizer;

use crate::document::DocumentNode;
use crate::error::Result;
use std::sync::Arc;

/// Turns node content into `RichToken`s with stable per-node offsets
///
/// Every node is tokenized in isolation, so re-tokenizing a node always
/// yields the same sequence regardless of its neighbours.
#[derive(Clone)]
pub struct TokenizerAdapter {
    backend: Arc<dyn TokenizerBackend>,
}

impl TokenizerAdapter {
    pub fn new(backend: impl TokenizerBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Tokenize a node and record its token count in the node metadata
    pub fn tokenize(&self, node: &mut DocumentNode) -> Result<Vec<RichToken>> {
        let tokens = self.tokenize_text(&node.id, &node.content)?;
        node.set_token_count(tokens.len());
        Ok(tokens)
    }

    /// Tokenize text on behalf of `element_id` without touching any node
    ///
    /// Token `i` covers the content from its own start up to the start of
    /// token `i + 1`; the first token starts at the beginning of the text and
    /// the last one runs to its end. Tokens that would cover nothing are
    /// dropped and indices renumbered.
    pub fn tokenize_text(&self, element_id: &str, text: &str) -> Result<Vec<RichToken>> {
        let encoded: Vec<EncodedToken> = self
            .backend
            .encode(text)?
            .into_iter()
            .filter(|t| t.end > t.start)
            .collect();

        if encoded.is_empty() {
            return Ok(Vec::new());
        }

        // Cut points between consecutive tokens, monotone and on char boundaries
        let mut bounds = Vec::with_capacity(encoded.len() + 1);
        bounds.push(0);
        for token in &encoded[1..] {
            let prev = *bounds.last().unwrap_or(&0);
            bounds.push(ceil_char_boundary(text, token.start.max(prev)));
        }
        bounds.push(text.len());

        let mut tokens = Vec::with_capacity(encoded.len());
        for (i, token) in encoded.iter().enumerate() {
            let (start, end) = (bounds[i], bounds[i + 1]);
            if end <= start {
                continue;
            }
            tokens.push(RichToken {
                element_id: element_id.to_string(),
                token_index: tokens.len(),
                token_code: token.code,
                text: text[start..end].to_string(),
            });
        }

        Ok(tokens)
    }

    /// Number of tokens `text` would produce
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.tokenize_text("", text)?.len())
    }

    /// Decode token codes through the backend
    pub fn detokenize(&self, tokens: &[RichToken]) -> Result<String> {
        let codes: Vec<u32> = tokens.iter().map(|t| t.token_code).collect();
        self.backend.decode(&codes)
    }
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
