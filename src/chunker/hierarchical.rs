use super::config::HierarchicalConfig;
use crate::document::{Document, NodeId, NodeType};
use crate::error::Result;
use crate::splitter::{find_splits, slice_at};
use crate::tokenizer::{RichToken, TokenizerAdapter};
use std::collections::VecDeque;
use tracing::debug;

/// Header-aware chunking along the document tree
///
/// A subtree that fits the budget becomes one chunk. Otherwise its children
/// are chunked on their own, each chunk prefixed with the node's tokens, and
/// neighbouring children that were not split themselves are merged while
/// they fit.
pub(crate) struct HierarchicalChunker<'a> {
    pub tokenizer: &'a TokenizerAdapter,
    pub config: &'a HierarchicalConfig,
}

impl HierarchicalChunker<'_> {
    pub fn chunk_tokens(&self, doc: &mut Document) -> Result<Vec<Vec<RichToken>>> {
        let root = doc.root();
        self.from_node(doc, root, VecDeque::new())
    }

    /// `ancestors` holds the token cost of each header above `id`, oldest first
    fn from_node(
        &self,
        doc: &mut Document,
        id: NodeId,
        mut ancestors: VecDeque<usize>,
    ) -> Result<Vec<Vec<RichToken>>> {
        let max_tokens = self.config.max_tokens;
        let mut ancestor_cnt: usize = ancestors.iter().sum();
        let max_content = max_tokens.saturating_sub(ancestor_cnt);

        let subtree_cnt = self.tokenizer.count_tokens(&doc.subtree_text(id))?;
        let own = self.node_tokens(doc, id)?;

        if subtree_cnt <= max_content {
            return Ok(vec![self.subtree_tokens(doc, id, own)?]);
        }

        if !doc.node(id).has_children() {
            debug!(id = %doc.node(id).id, tokens = own.len(), budget = max_content, "splitting leaf");
            return Ok(slice_at(&own, &find_splits(&own, max_content)));
        }

        ancestors.push_back(own.len());
        ancestor_cnt += own.len();

        // Drop the highest headers first once they take too much room
        while ancestor_cnt > self.config.max_parent_tokens() {
            match ancestors.pop_front() {
                Some(cnt) => ancestor_cnt -= cnt,
                None => break,
            }
        }

        let mut out = Vec::new();
        let mut pending: Vec<RichToken> = Vec::new();

        let children = doc.node(id).children().to_vec();
        for child in children {
            let mut results = self
                .from_node(doc, child, ancestors.clone())?
                .into_iter()
                .filter(|tokens| !tokens.is_empty());

            let Some(first) = results.next() else {
                continue;
            };
            let rest: Vec<Vec<RichToken>> = results.collect();

            if !rest.is_empty() {
                // The child was split, nothing merges across it
                if !pending.is_empty() {
                    out.push(self.prefix(std::mem::take(&mut pending), &own));
                }
                out.push(self.prefix(first, &own));
                out.extend(rest.into_iter().map(|tokens| self.prefix(tokens, &own)));
            } else if !pending.is_empty() && pending.len() + first.len() + ancestor_cnt <= max_tokens {
                pending.extend(first);
            } else {
                if !pending.is_empty() {
                    out.push(self.prefix(std::mem::take(&mut pending), &own));
                }
                pending = first;
            }
        }

        if !pending.is_empty() {
            out.push(self.prefix(pending, &own));
        }

        Ok(out)
    }

    /// Tokens of a node and everything below it, rows contributing only
    /// their own content
    fn subtree_tokens(
        &self,
        doc: &mut Document,
        id: NodeId,
        mut tokens: Vec<RichToken>,
    ) -> Result<Vec<RichToken>> {
        if doc.node(id).kind == NodeType::TableRow {
            return Ok(tokens);
        }

        let children = doc.node(id).children().to_vec();
        for child in children {
            let own = self.node_tokens(doc, child)?;
            tokens.extend(self.subtree_tokens(doc, child, own)?);
        }

        Ok(tokens)
    }

    /// Prefix `tokens` with a header's tokens when both fit together
    fn prefix(&self, tokens: Vec<RichToken>, header: &[RichToken]) -> Vec<RichToken> {
        if header.is_empty() || tokens.len() + header.len() > self.config.max_tokens {
            return tokens;
        }

        let mut prefixed = header.to_vec();
        prefixed.extend(tokens);
        prefixed
    }

    fn node_tokens(&self, doc: &mut Document, id: NodeId) -> Result<Vec<RichToken>> {
        // The root holds document metadata, keep token counts out of it
        if id == doc.root() {
            let root = doc.node(id);
            return self.tokenizer.tokenize_text(&root.id, &root.content);
        }

        self.tokenizer.tokenize(doc.node_mut(id))
    }
}
