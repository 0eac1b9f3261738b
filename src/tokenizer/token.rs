/// A token tagged with the node it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichToken {
    /// Id of the origin node
    pub element_id: String,
    /// Position within the origin node's own token sequence
    pub token_index: usize,
    /// Opaque tokenizer id
    pub token_code: u32,
    /// Exact substring of the origin node's content covered by this token
    pub text: String,
}

impl RichToken {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Concatenated text of a token slice
pub fn join_text(tokens: &[RichToken]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}
