//! Fakes shared by the chain and session tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use index::{MemoryVectorStore, Retriever};
use ingest::Chunk;
use llm::{ChatMessage, ChatModel, ChatReply, Embedder, LlmError};

use crate::chain::RagChain;
use crate::prompt::FALLBACK_ANSWER;

const VOCABULARY: [&str; 7] = ["sky", "blue", "color", "paris", "france", "capital", "museums"];

/// Bag-of-words over a tiny fixed vocabulary.
#[derive(Default)]
pub struct WordEmbedder {
    pub query_calls: AtomicUsize,
}

fn bag_of_words(text: &str) -> Vec<f32> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .collect();
    VOCABULARY
        .iter()
        .map(|term| words.iter().filter(|w| w == term).count() as f32)
        .collect()
}

#[async_trait]
impl Embedder for WordEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().map(|t| bag_of_words(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        Ok(bag_of_words(text))
    }

    fn model_name(&self) -> &str {
        "bag-of-words"
    }
}

/// Plays back queued replies, then answers with the fallback sentence.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<ChatReply, LlmError>>>,
    last: Mutex<Vec<ChatMessage>>,
    pub calls: AtomicUsize,
}

impl ScriptedChat {
    pub fn with_replies(replies: Vec<Result<ChatReply, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::with_replies(texts.iter().map(|t| Ok(ChatReply::from_text(*t))).collect())
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = messages.to_vec();
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatReply::from_text(FALLBACK_ANSWER)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub async fn chain_over(
    texts: &[&str],
    embedder: Arc<WordEmbedder>,
    chat: Arc<ScriptedChat>,
) -> RagChain {
    let chunks = texts
        .iter()
        .map(|t| Chunk::new("doc".into(), t.to_string(), "test.pdf".into(), None, None))
        .collect();
    let store = MemoryVectorStore::from_chunks(chunks, embedder.as_ref())
        .await
        .unwrap();
    RagChain::new(Retriever::new(Arc::new(store), embedder), chat)
}
