use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use llm::Embedder;

use crate::store::{MemoryVectorStore, ScoredChunk};

pub const DEFAULT_K: usize = 4;

/// Embeds a question and looks up its nearest chunks.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<MemoryVectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl Retriever {
    pub fn new(store: Arc<MemoryVectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            k: DEFAULT_K,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let query_embedding = self
            .embedder
            .embed_query(query)
            .await
            .context("Failed to embed query")?;

        let results = self
            .store
            .similarity_search_by_vector(&query_embedding, self.k)?;

        debug!(
            retrieved = results.len(),
            top_score = results.first().map(|r| r.score),
            "Retrieved chunks"
        );

        Ok(results)
    }
}
