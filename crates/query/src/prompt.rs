use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

use extract::PromptTemplate;
use index::ScoredChunk;
use llm::ChatMessage;

/// The exact sentence the model is told to give when the context has no answer.
pub const FALLBACK_ANSWER: &str = "I don’t know based on the document.";

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. You must only use the context provided. If the answer is not found in the context, respond exactly: \"I don’t know based on the document.\"";

pub const USER_TEMPLATE: &str = "Context:\n{context}\n\nQuestion:\n{question}";

/// Chunk texts in rank order, blank-line separated.
pub fn format_documents_as_string(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|scored| scored.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledPrompt {
    pub context: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system: String,
    user: PromptTemplate,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            user: PromptTemplate::from_template(USER_TEMPLATE),
        }
    }
}

impl PromptAssembler {
    pub fn assemble(&self, question: &str, retrieved: &[ScoredChunk]) -> Result<AssembledPrompt> {
        let context = format_documents_as_string(retrieved);
        let values = HashMap::from([
            ("context", context.clone()),
            ("question", question.to_string()),
        ]);
        let user = self.user.format(&values)?;

        Ok(AssembledPrompt {
            context,
            messages: vec![ChatMessage::system(self.system.clone()), ChatMessage::user(user)],
        })
    }
}
