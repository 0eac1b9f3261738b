use crate::tokenizer::RichToken;

/// Split delimiters from coarsest to finest
///
/// Paragraph and line breaks first, then sentence and clause punctuation,
/// then whitespace. The empty string matches every token, so the last level
/// can always cut a segment down to single tokens.
pub const DEFAULT_DELIMITERS: &[&str] = &["\n\n", "\n", ".", ";", ",", " ", ""];

/// Split points for `tokens` under a token budget, using [`DEFAULT_DELIMITERS`]
pub fn find_splits(tokens: &[RichToken], max_tokens: usize) -> Vec<usize> {
    find_splits_with(tokens, max_tokens, DEFAULT_DELIMITERS)
}

/// Split points for `tokens` under a token budget
///
/// Returns exclusive end offsets into `tokens`; the last one is always
/// `tokens.len()`. Every segment holds at most `max_tokens` tokens and no two
/// neighbouring segments fit into the budget together.
pub fn find_splits_with(tokens: &[RichToken], max_tokens: usize, delimiters: &[&str]) -> Vec<usize> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let max_tokens = max_tokens.max(1);
    let mut splits = Vec::new();
    split_level(tokens, max_tokens, delimiters, 0, 0, &mut splits);

    merge_adjacent(&splits, max_tokens)
}

fn split_level(
    tokens: &[RichToken],
    max_tokens: usize,
    delimiters: &[&str],
    level: usize,
    offset: usize,
    out: &mut Vec<usize>,
) {
    // Past the end of the hierarchy every token is a candidate
    let mut candidates: Vec<usize> = match delimiters.get(level) {
        Some(delimiter) => tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.text.contains(delimiter))
            .map(|(i, _)| i + 1)
            .collect(),
        None => (1..=tokens.len()).collect(),
    };
    if candidates.last() != Some(&tokens.len()) {
        candidates.push(tokens.len());
    }

    let mut prev_split = 0;
    let mut prev_len = 0;

    for split in candidates {
        let mut len = split - prev_split;

        if len > max_tokens {
            // Delimiter too coarse for this segment, go one level finer
            split_level(
                &tokens[prev_split..split],
                max_tokens,
                delimiters,
                level + 1,
                offset + prev_split,
                out,
            );
        } else {
            // Fold undersized segments into the previous one
            if prev_split > 0 && prev_len + len <= max_tokens {
                out.pop();
                len += prev_len;
            }
            out.push(offset + split);
        }

        prev_len = len;
        prev_split = split;
    }
}

/// Greedy left-to-right merge of neighbouring segments that fit together
fn merge_adjacent(splits: &[usize], max_tokens: usize) -> Vec<usize> {
    let mut merged: Vec<usize> = Vec::with_capacity(splits.len());
    let mut group_start = 0;

    for &end in splits {
        if let Some(last) = merged.last_mut() {
            if end - group_start <= max_tokens {
                *last = end;
                continue;
            }
            group_start = *last;
        }
        merged.push(end);
    }

    merged
}

/// Cut `tokens` at the given end offsets
pub fn slice_at(tokens: &[RichToken], splits: &[usize]) -> Vec<Vec<RichToken>> {
    let mut prev = 0;
    splits
        .iter()
        .map(|&split| {
            let slice = tokens[prev..split].to_vec();
            prev = split;
            slice
        })
        .collect()
}
