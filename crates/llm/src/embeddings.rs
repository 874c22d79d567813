use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::LlmError;
use crate::http::OpenAiHttp;
use crate::retry::RetryPolicy;
use crate::traits::Embedder;

const EMBEDDINGS_PATH: &str = "embeddings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model: String,
    /// Maximum inputs per request.
    pub batch_size: usize,
    /// Replace newlines with spaces before embedding.
    pub strip_new_lines: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-large".to_string(),
            batch_size: 512,
            strip_new_lines: true,
        }
    }
}

#[derive(Clone)]
pub struct EmbeddingClient {
    http: OpenAiHttp,
    settings: EmbeddingSettings,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingClient {
    pub fn new(
        config: ApiConfig,
        settings: EmbeddingSettings,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: OpenAiHttp::new(config, retry)?,
            settings,
        })
    }

    fn prepare(&self, text: &str) -> String {
        if self.settings.strip_new_lines {
            text.replace('\n', " ")
        } else {
            text.to_string()
        }
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let request = EmbeddingRequest {
            model: &self.settings.model,
            input: inputs,
        };

        let raw = self.http.post_json(EMBEDDINGS_PATH, &request).await?;
        let mut parsed: EmbeddingResponse =
            serde_json::from_value(raw).map_err(|err| LlmError::Malformed {
                endpoint: self.http.endpoint(EMBEDDINGS_PATH),
                reason: err.to_string(),
            })?;

        if parsed.data.len() != inputs.len() {
            return Err(LlmError::Malformed {
                endpoint: self.http.endpoint(EMBEDDINGS_PATH),
                reason: format!(
                    "returned {} embeddings for {} inputs",
                    parsed.data.len(),
                    inputs.len()
                ),
            });
        }

        parsed.data.sort_by_key(|entry| entry.index);
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let prepared: Vec<String> = texts.iter().map(|text| self.prepare(text)).collect();
        let mut vectors = Vec::with_capacity(prepared.len());

        for batch in prepared.chunks(self.settings.batch_size.max(1)) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let input = [self.prepare(text)];
        let mut vectors = self.embed_batch(&input).await?;
        vectors.pop().ok_or_else(|| LlmError::Malformed {
            endpoint: self.http.endpoint(EMBEDDINGS_PATH),
            reason: "no embedding returned for query".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}
