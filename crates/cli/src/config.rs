use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use ingest::ChunkerConfig;
use llm::{ApiConfig, ChatSettings, CompletionSettings, EmbeddingSettings, RetryPolicy};

pub const CHARACTER_DESCRIPTION: &str = "A software engineer in Canada, born in Hong Kong.";
pub const PDF_DIR: &str = "pdfs";
/// Upper bound on a single API request, retries included separately.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryConfig {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10000,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.initial_backoff_ms, self.max_backoff_ms)
    }
}

/// Settings for the `character` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    pub description: String,
    pub completion: CompletionSettings,
    pub retry: RetryConfig,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            description: CHARACTER_DESCRIPTION.to_string(),
            completion: CompletionSettings::default(),
            retry: RetryConfig::with_max_retries(2),
        }
    }
}

/// Settings for the `pdf_qa` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfQaConfig {
    pub pdf_dir: PathBuf,
    pub chunker: ChunkerConfig,
    pub embeddings: EmbeddingSettings,
    pub chat: ChatSettings,
    pub retry: RetryConfig,
    pub top_k: usize,
}

impl Default for PdfQaConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from(PDF_DIR),
            chunker: ChunkerConfig::default(),
            embeddings: EmbeddingSettings::default(),
            chat: ChatSettings::default(),
            retry: RetryConfig::with_max_retries(6),
            top_k: index::DEFAULT_K,
        }
    }
}

/// Loads `.env` when present, then requires the API key from the environment.
pub fn load_api_config() -> Result<ApiConfig> {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => return Err(err).context("Failed to load .env file"),
    }

    Ok(ApiConfig::from_env()?.with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_defaults() {
        let config = CharacterConfig::default();
        assert_eq!(config.description, CHARACTER_DESCRIPTION);
        assert_eq!(config.completion.model, "gpt-3.5-turbo-instruct");
        assert_eq!(config.completion.temperature, 0.0);
        assert_eq!(config.retry.policy().max_retries(), 2);
    }

    #[test]
    fn test_pdf_qa_defaults() {
        let config = PdfQaConfig::default();
        assert_eq!(config.pdf_dir, PathBuf::from("pdfs"));
        assert_eq!(config.chunker.chunk_size, 700);
        assert_eq!(config.chunker.chunk_overlap, 100);
        assert_eq!(config.chat.model, "gpt-3.5-turbo");
        assert_eq!(config.embeddings.model, "text-embedding-3-large");
        assert_eq!(config.retry.max_retries, 6);
        assert_eq!(config.top_k, 4);
    }
}
