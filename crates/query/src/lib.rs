pub mod chain;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod testing;

pub use chain::{QueryTurn, RagChain};
pub use prompt::{
    AssembledPrompt, FALLBACK_ANSWER, PromptAssembler, SYSTEM_PROMPT, format_documents_as_string,
};
pub use session::{Answerer, InteractionLoop, PROMPT, SessionSummary, is_exit};
