use super::config::FixedSizeConfig;
use crate::tokenizer::RichToken;
use std::iter::Fuse;

/// Cuts a stream of node tokens into windows of exactly `max_tokens`
///
/// Consecutive windows share `overlap` tokens. The final window holds
/// whatever is left and may be shorter.
pub struct FixedSizeSlices<I: Iterator<Item = Vec<RichToken>>> {
    nodes: Fuse<I>,
    queue: Vec<RichToken>,
    max_tokens: usize,
    overlap: usize,
}

impl<I: Iterator<Item = Vec<RichToken>>> FixedSizeSlices<I> {
    pub fn new(nodes: I, config: &FixedSizeConfig) -> Self {
        let max_tokens = config.max_tokens.max(1);
        Self {
            nodes: nodes.fuse(),
            queue: Vec::new(),
            max_tokens,
            overlap: config.overlap.min(max_tokens - 1),
        }
    }
}

impl<I: Iterator<Item = Vec<RichToken>>> Iterator for FixedSizeSlices<I> {
    type Item = Vec<RichToken>;

    fn next(&mut self) -> Option<Vec<RichToken>> {
        loop {
            if self.queue.len() > self.max_tokens {
                let window = self.queue[..self.max_tokens].to_vec();
                self.queue.drain(..self.max_tokens - self.overlap);
                return Some(window);
            }

            match self.nodes.next() {
                Some(tokens) => self.queue.extend(tokens),
                None if self.queue.is_empty() => return None,
                None => return Some(std::mem::take(&mut self.queue)),
            }
        }
    }
}
