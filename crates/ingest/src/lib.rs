pub mod chunk;
pub mod chunker;
pub mod document;
pub mod loader;

pub use chunk::Chunk;
pub use chunker::{Chunker, ChunkerConfig};
pub use document::DocumentRecord;
pub use loader::{DirectoryLoader, PdfLoader};

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

/// Generate a stable document ID from file path
pub fn generate_doc_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Load every PDF under `dir_path` and split it into chunks.
pub async fn ingest_directory(dir_path: &Path, config: ChunkerConfig) -> Result<Vec<Chunk>> {
    let chunker = Chunker::new(config)?;
    let documents = DirectoryLoader::load(dir_path).await?;
    let chunks = chunker.split_documents(&documents);

    info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "Split documents into chunks"
    );

    Ok(chunks)
}
