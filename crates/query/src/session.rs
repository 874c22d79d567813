use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info, warn};

pub const PROMPT: &str = "Ask me! (or type 'exit'): ";
pub const EXIT_KEYWORD: &str = "exit";

/// Turns a question into the text printed back to the user.
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, question: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub answered: usize,
    pub failed: usize,
}

pub fn is_exit(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_KEYWORD)
}

/// Prompt, read a line, answer, repeat until `exit` or end of input.
pub struct InteractionLoop {
    answerer: Arc<dyn Answerer>,
}

impl InteractionLoop {
    pub fn new(answerer: Arc<dyn Answerer>) -> Self {
        Self { answerer }
    }

    /// Takes ownership of `input` so it is closed when the loop ends.
    pub async fn run<R, W>(&self, mut input: R, output: &mut W) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut summary = SessionSummary::default();
        let mut buf = Vec::new();

        loop {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .await
                .context("Failed to read from input")?;
            if read == 0 {
                writeln!(output)?;
                debug!("Input closed");
                break;
            }

            // A mis-encoded line is still a question; only I/O errors end the session.
            let line = String::from_utf8_lossy(&buf);
            if std::str::from_utf8(&buf).is_err() {
                warn!(bytes = read, "Input line is not valid UTF-8, decoding lossily");
            }

            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit(question) {
                break;
            }

            match self.answerer.answer(question).await {
                Ok(reply) => {
                    writeln!(output, "response:: {}", reply)?;
                    summary.answered += 1;
                }
                Err(err) => {
                    error!(error = %format!("{:#}", err), "Failed to answer question");
                    summary.failed += 1;
                }
            }
        }

        info!(
            answered = summary.answered,
            failed = summary.failed,
            "Session ended"
        );
        Ok(summary)
    }
}
