use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::LlmError;
use crate::http::OpenAiHttp;
use crate::observer::ModelObserver;
use crate::retry::RetryPolicy;
use crate::traits::ChatModel;

const CHAT_PATH: &str = "chat/completions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat model's answer plus the raw payload it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub finish_reason: Option<String>,
    pub raw: Value,
}

impl ChatReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: serde_json::json!({ "role": "assistant", "content": text }),
            content: Some(text),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Plain-text content, if the reply carries any.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|content| !content.is_empty())
    }
}

impl fmt::Display for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => f.write_str(text),
            None => write!(f, "{}", self.raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

#[derive(Clone)]
pub struct ChatClient {
    http: OpenAiHttp,
    settings: ChatSettings,
    observer: Option<Arc<dyn ModelObserver>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Value,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl ChatClient {
    pub fn new(
        config: ApiConfig,
        settings: ChatSettings,
        retry: RetryPolicy,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http: OpenAiHttp::new(config, retry)?,
            settings,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ModelObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

}

#[async_trait]
impl ChatModel for ChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatReply, LlmError> {
        let request = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            messages,
        };

        let raw = self.http.post_json(CHAT_PATH, &request).await?;
        if let Some(observer) = &self.observer {
            observer.on_response(&self.settings.model, &raw);
        }

        let parsed: ChatResponse =
            serde_json::from_value(raw).map_err(|err| LlmError::Malformed {
                endpoint: self.http.endpoint(CHAT_PATH),
                reason: err.to_string(),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Malformed {
                endpoint: self.http.endpoint(CHAT_PATH),
                reason: "response contained no choices".to_string(),
            })?;

        // Tool calls and refusals arrive with a null content.
        let content = choice
            .message
            .get("content")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(ChatReply {
            content,
            finish_reason: choice.finish_reason,
            raw: choice.message,
        })
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}
