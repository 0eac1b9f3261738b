use super::{EncodedToken, TokenizerBackend};
use crate::error::{ChunkError, Result};
use std::path::Path;
use tokenizers::Tokenizer;

/// HuggingFace tokenizer loaded from a `tokenizer.json`
pub struct HfTokenizer {
    inner: Tokenizer,
    name: String,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path)
            .map_err(|e| ChunkError::collaborator("tokenizer load", e))?;
        let name = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("tokenizer")
            .to_string();
        Self::from_tokenizer(inner, name)
    }

    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
        let inner = Tokenizer::from_bytes(bytes)
            .map_err(|e| ChunkError::collaborator("tokenizer load", e))?;
        Self::from_tokenizer(inner, name.into())
    }

    fn from_tokenizer(mut inner: Tokenizer, name: String) -> Result<Self> {
        // Chunking must see every token, so model-side limits are lifted
        inner
            .with_truncation(None)
            .map_err(|e| ChunkError::collaborator("tokenizer config", e))?;
        inner.with_padding(None);
        Ok(Self { inner, name })
    }
}

impl TokenizerBackend for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<EncodedToken>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| ChunkError::collaborator("tokenizer encode", e))?;

        Ok(encoding
            .get_ids()
            .iter()
            .zip(encoding.get_offsets())
            .map(|(&code, &(start, end))| EncodedToken { code, start, end })
            .collect())
    }

    fn decode(&self, codes: &[u32]) -> Result<String> {
        self.inner
            .decode(codes, true)
            .map_err(|e| ChunkError::collaborator("tokenizer decode", e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
