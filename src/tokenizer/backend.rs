use crate::error::Result;

/// One token as reported by a tokenizer, with byte offsets into the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedToken {
    pub code: u32,
    pub start: usize,
    pub end: usize,
}

/// Subword tokenizer used to measure and cut text
pub trait TokenizerBackend: Send + Sync {
    /// Encode text without special tokens, reporting byte offsets
    fn encode(&self, text: &str) -> Result<Vec<EncodedToken>>;

    /// Turn token codes back into text
    fn decode(&self, codes: &[u32]) -> Result<String>;

    /// Short human-readable name, recorded in result metadata
    fn name(&self) -> &str;
}
