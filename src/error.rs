use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("No chunkable content found in document")]
    EmptyDocument,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChunkError {
    /// Wrap a failed collaborator call (tokenizer, embedder, ...) as malformed input
    pub fn collaborator(name: &str, err: impl std::fmt::Display) -> Self {
        Self::MalformedInput(format!("{} failed: {}", name, err))
    }
}

pub type Result<T> = std::result::Result<T, ChunkError>;
