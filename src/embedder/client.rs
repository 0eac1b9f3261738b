use super::types::{EmbeddingRequest, EmbeddingResponse};
use super::{Batcher, Embedder};
use crate::error::{ChunkError, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// Blocking client for an HTTP embedding server
///
/// Posts `{"texts": [...]}` to `<endpoint>/embed` and expects
/// `{"embeddings": [[...], ...]}` back, one vector per text.
pub struct HttpEmbedder {
    http: Client,
    endpoint: String,
    batcher: Batcher,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(60))
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChunkError::collaborator("embedding client", e))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            batcher: Batcher::default(),
        })
    }

    pub fn with_batcher(mut self, batcher: Batcher) -> Self {
        self.batcher = batcher;
        self
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .http
            .post(format!("{}/embed", self.endpoint))
            .json(&EmbeddingRequest { texts })
            .send()
            .map_err(|e| ChunkError::collaborator("embedding request", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChunkError::collaborator(
                "embedding request",
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let body: EmbeddingResponse = response
            .json()
            .map_err(|e| ChunkError::collaborator("embedding response", e))?;

        if body.embeddings.len() != texts.len() {
            return Err(ChunkError::collaborator(
                "embedding response",
                format!("expected {} vectors, got {}", texts.len(), body.embeddings.len()),
            ));
        }

        Ok(body.embeddings)
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in self.batcher.split(texts) {
            debug!(size = batch.len(), endpoint = %self.endpoint, "embedding batch");
            embeddings.extend(self.embed_batch(batch)?);
        }

        Ok(embeddings)
    }
}
