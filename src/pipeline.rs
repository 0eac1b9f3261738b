use crate::chunker::{ChunkingResult, DocumentChunker};
use crate::document::Document;
use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Outcome of a batch run
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    /// Chunk files written, one per successful document
    pub written: Vec<PathBuf>,
    /// Documents that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Compute SHA256 hash of file contents
pub fn hash_file(path: &Path) -> Result<String> {
    let contents = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

/// Where the chunks of `source` are written for the chunker's configuration
pub fn output_path(chunker: &DocumentChunker, source: &Path, output_root: &Path) -> PathBuf {
    let file_name = source.file_name().unwrap_or(source.as_os_str());
    output_root.join(chunker.config().config_dir()).join(file_name)
}

/// Chunk one parsed document and write the result as pretty JSON
///
/// The result metadata additionally records the source hash and path, the
/// output path, the chunking time in seconds and a UTC timestamp.
pub fn process_document(
    chunker: &DocumentChunker,
    path: &Path,
    output_root: &Path,
) -> Result<ChunkingResult> {
    let mut doc = Document::load(path)?;
    let source_hash = hash_file(path)?;
    info!(path = %path.display(), strategy = chunker.config().name(), "chunking document");

    let start = Instant::now();
    let mut result = chunker.segment(&mut doc)?;
    let elapsed = start.elapsed().as_secs_f64();

    let destination = output_path(chunker, path, output_root);
    let metadata = &mut result.metadata;
    metadata.insert("source_hash".to_string(), Value::from(source_hash));
    metadata.insert("source_path".to_string(), Value::from(path.display().to_string()));
    metadata.insert("chunk_path".to_string(), Value::from(destination.display().to_string()));
    metadata.insert("chunking_time".to_string(), Value::from(elapsed));
    metadata.insert("chunked_at".to_string(), Value::from(Utc::now().to_rfc3339()));

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&destination, result.to_json_pretty()?)?;

    info!(
        path = %destination.display(),
        chunks = result.chunks.len(),
        seconds = elapsed,
        "wrote chunks"
    );
    Ok(result)
}

/// All `*.json` files below `dir`, sorted, skipping anything under `exclude`
pub fn collect_documents(dir: &Path, exclude: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| exclude.map_or(true, |skip| !e.path().starts_with(skip)))
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Chunk every parsed document below `dir`
///
/// A failing document is logged and recorded in the report; the rest of the
/// batch still runs.
pub fn process_batch(chunker: &DocumentChunker, dir: &Path, output_root: &Path) -> Result<BatchReport> {
    let files = collect_documents(dir, Some(output_root))?;
    info!(dir = %dir.display(), documents = files.len(), "starting batch");

    let mut report = BatchReport::default();
    for path in files {
        match process_document(chunker, &path, output_root) {
            Ok(_) => report.written.push(output_path(chunker, &path, output_root)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping document");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}
