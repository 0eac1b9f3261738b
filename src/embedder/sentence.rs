use unicode_segmentation::UnicodeSegmentation;

/// Splits text into sentences
pub trait SentenceSplitter: Send + Sync {
    /// Sentences of `text` as contiguous, in-order slices of it
    fn split<'t>(&self, text: &'t str) -> Vec<&'t str>;
}

/// UAX #29 sentence boundaries; trailing whitespace stays with its sentence
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        text.split_sentence_bounds().collect()
    }
}
