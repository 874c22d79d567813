//! Model seams the pipelines depend on.

use async_trait::async_trait;

use crate::chat::{ChatMessage, ChatReply};
use crate::error::LlmError;

/// Text-in, text-out completion model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

/// Message-list chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError>;

    fn model_name(&self) -> &str;
}

/// Embedding generation
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    fn model_name(&self) -> &str;
}
