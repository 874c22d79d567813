pub mod retriever;
pub mod store;

pub use retriever::{DEFAULT_K, Retriever};
pub use store::{MemoryVectorStore, ScoredChunk, cosine_similarity};

use anyhow::Result;
use ingest::{ChunkerConfig, ingest_directory};
use llm::Embedder;
use std::path::Path;

/// Load, chunk and embed every PDF under `dir`.
pub async fn build_store_from_directory(
    dir: &Path,
    chunker: ChunkerConfig,
    embedder: &dyn Embedder,
) -> Result<MemoryVectorStore> {
    let chunks = ingest_directory(dir, chunker).await?;
    MemoryVectorStore::from_chunks(chunks, embedder).await
}
