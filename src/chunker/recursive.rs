use super::config::RecursiveConfig;
use crate::splitter::{find_splits, slice_at};
use crate::tokenizer::RichToken;
use std::collections::VecDeque;
use std::iter::Fuse;

/// Splits a stream of node tokens at delimiter boundaries
///
/// Once the queue outgrows `max_tokens` every segment but the last is
/// emitted. The last one stays queued so the next node can extend it,
/// together with `overlap` tokens of context before it.
pub struct RecursiveSlices<I: Iterator<Item = Vec<RichToken>>> {
    nodes: Fuse<I>,
    queue: Vec<RichToken>,
    ready: VecDeque<Vec<RichToken>>,
    max_tokens: usize,
    overlap: usize,
}

impl<I: Iterator<Item = Vec<RichToken>>> RecursiveSlices<I> {
    pub fn new(nodes: I, config: &RecursiveConfig) -> Self {
        Self {
            nodes: nodes.fuse(),
            queue: Vec::new(),
            ready: VecDeque::new(),
            max_tokens: config.max_tokens.max(1),
            overlap: config.overlap,
        }
    }

    fn split_queue(&mut self) {
        let mut splits = find_splits(&self.queue, self.max_tokens);
        splits.pop();

        let mut prev = 0;
        for split in splits {
            self.ready.push_back(self.queue[prev..split].to_vec());
            prev = split;
        }

        self.queue.drain(..prev.saturating_sub(self.overlap));
    }

    fn flush_residual(&mut self) {
        let residual = std::mem::take(&mut self.queue);
        if residual.len() <= self.max_tokens {
            self.ready.push_back(residual);
            return;
        }

        // Carried-over context can push the residual past the budget
        self.ready
            .extend(slice_at(&residual, &find_splits(&residual, self.max_tokens)));
    }
}

impl<I: Iterator<Item = Vec<RichToken>>> Iterator for RecursiveSlices<I> {
    type Item = Vec<RichToken>;

    fn next(&mut self) -> Option<Vec<RichToken>> {
        loop {
            if let Some(slice) = self.ready.pop_front() {
                return Some(slice);
            }

            match self.nodes.next() {
                Some(tokens) => {
                    self.queue.extend(tokens);
                    if self.queue.len() > self.max_tokens {
                        self.split_queue();
                    }
                }
                None if self.queue.is_empty() => return None,
                None => self.flush_residual(),
            }
        }
    }
}
