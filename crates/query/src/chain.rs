use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use index::{Retriever, ScoredChunk};
use llm::{ChatModel, ChatReply};

use crate::prompt::{AssembledPrompt, PromptAssembler};
use crate::session::Answerer;

/// One question and everything produced while answering it.
#[derive(Debug, Clone)]
pub struct QueryTurn {
    pub question: String,
    pub retrieved: Vec<ScoredChunk>,
    pub prompt: AssembledPrompt,
    pub reply: ChatReply,
}

/// Retrieve, assemble, ask. Holds no state between turns.
#[derive(Clone)]
pub struct RagChain {
    retriever: Retriever,
    assembler: PromptAssembler,
    chat: Arc<dyn ChatModel>,
}

impl RagChain {
    pub fn new(retriever: Retriever, chat: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            assembler: PromptAssembler::default(),
            chat,
        }
    }

    pub async fn run_turn(&self, question: &str) -> Result<QueryTurn> {
        let retrieved = self.retriever.retrieve(question).await?;
        let prompt = self.assembler.assemble(question, &retrieved)?;
        debug!(messages = ?prompt.messages, "Assembled chat messages");

        let reply = self
            .chat
            .chat(&prompt.messages)
            .await
            .context(format!("Chat request to {} failed", self.chat.model_name()))?;

        Ok(QueryTurn {
            question: question.to_string(),
            retrieved,
            prompt,
            reply,
        })
    }
}

#[async_trait]
impl Answerer for RagChain {
    async fn answer(&self, question: &str) -> Result<String> {
        let turn = self.run_turn(question).await?;
        Ok(turn.reply.to_string())
    }
}
