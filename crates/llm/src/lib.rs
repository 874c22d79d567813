//! OpenAI-compatible model clients.
//!
//! Every client shares one authenticated transport with a [`RetryPolicy`] and is exposed to
//! the rest of the workspace through the [`CompletionModel`], [`ChatModel`] and [`Embedder`]
//! traits. Completion and chat clients accept a [`ModelObserver`] that sees every raw
//! response payload.

pub mod chat;
pub mod completion;
pub mod config;
pub mod embeddings;
pub mod error;
mod http;
pub mod observer;
pub mod retry;
pub mod traits;

pub use chat::{ChatClient, ChatMessage, ChatReply, ChatSettings, Role};
pub use completion::{CompletionClient, CompletionSettings};
pub use config::{ApiConfig, ConfigError};
pub use embeddings::{EmbeddingClient, EmbeddingSettings};
pub use error::LlmError;
pub use observer::{ModelObserver, TracingObserver};
pub use retry::{RetryPolicy, Transient};
pub use traits::{ChatModel, CompletionModel, Embedder};
