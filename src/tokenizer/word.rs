use super::{EncodedToken, TokenizerBackend};
use crate::error::{ChunkError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use unicode_segmentation::UnicodeSegmentation;

/// Word-level tokenizer: one token per UAX #29 word or punctuation mark
///
/// Codes are assigned on first sight from an interning vocabulary, so the
/// same text always maps to the same codes within one instance.
#[derive(Default)]
pub struct WordTokenizer {
    vocab: Mutex<Vocab>,
}

#[derive(Default)]
struct Vocab {
    ids: HashMap<String, u32>,
    words: Vec<String>,
}

impl Vocab {
    fn intern(&mut self, word: &str) -> u32 {
        if let Some(&id) = self.ids.get(word) {
            return id;
        }
        let id = self.words.len() as u32;
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenizerBackend for WordTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<EncodedToken>> {
        let mut vocab = self.vocab.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(text
            .split_word_bound_indices()
            .filter(|(_, word)| !word.trim().is_empty())
            .map(|(start, word)| EncodedToken {
                code: vocab.intern(word),
                start,
                end: start + word.len(),
            })
            .collect())
    }

    fn decode(&self, codes: &[u32]) -> Result<String> {
        let vocab = self.vocab.lock().unwrap_or_else(PoisonError::into_inner);

        let words = codes
            .iter()
            .map(|&code| {
                vocab
                    .words
                    .get(code as usize)
                    .map(String::as_str)
                    .ok_or_else(|| ChunkError::collaborator("word decode", format!("unknown code {}", code)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(words.join(" "))
    }

    fn name(&self) -> &str {
        "word"
    }
}
