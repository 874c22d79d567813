use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use ingest::Chunk;
use llm::Embedder;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Chunks and their embeddings held in memory for the life of the process.
///
/// Built once from a full set of chunks; there is no way to add or remove entries afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryVectorStore {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimensions: Option<usize>,
}

impl MemoryVectorStore {
    /// Embeds every chunk text in one `embed_documents` call.
    pub async fn from_chunks(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder
            .embed_documents(&texts)
            .await
            .context("Failed to embed chunks")?;

        let store = Self::from_embeddings(chunks, vectors)?;
        info!(
            chunks = store.len(),
            dimensions = store.dimensions.unwrap_or(0),
            model = embedder.model_name(),
            "Built in-memory vector store"
        );
        Ok(store)
    }

    pub fn from_embeddings(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            bail!(
                "Got {} embeddings for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let dimensions = vectors.first().map(Vec::len);
        if let Some(dim) = dimensions {
            if let Some(pos) = vectors.iter().position(|v| v.len() != dim) {
                bail!(
                    "Embedding {} has {} dimensions, expected {}",
                    pos,
                    vectors[pos].len(),
                    dim
                );
            }
        }

        Ok(Self {
            chunks,
            vectors,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Top `k` chunks by cosine similarity, best first. Equal scores keep insertion order.
    pub fn similarity_search_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if let Some(dim) = self.dimensions {
            if query.len() != dim {
                bail!(
                    "Query embedding has {} dimensions, store has {}",
                    query.len(),
                    dim
                );
            }
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
