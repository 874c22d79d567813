use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::LlmError;
use crate::http::OpenAiHttp;
use crate::observer::ModelObserver;
use crate::retry::RetryPolicy;
use crate::traits::CompletionModel;

const COMPLETIONS_PATH: &str = "completions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    /// `None` leaves the cap to the server, i.e. as many tokens as fit the context.
    pub max_tokens: Option<u32>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-instruct".to_string(),
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// Client for the legacy text-completion endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    http: OpenAiHttp,
    settings: CompletionSettings,
    observer: Option<Arc<dyn ModelObserver>>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

impl CompletionClient {
    pub fn new(
        config: ApiConfig,
        settings: CompletionSettings,
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
impl CompletionModel for CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.settings.model,
            prompt,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let raw = self.http.post_json(COMPLETIONS_PATH, &request).await?;
        if let Some(observer) = &self.observer {
            observer.on_response(&self.settings.model, &raw);
        }

        let parsed: CompletionResponse =
            serde_json::from_value(raw).map_err(|err| LlmError::Malformed {
                endpoint: self.http.endpoint(COMPLETIONS_PATH),
                reason: err.to_string(),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| LlmError::Malformed {
                endpoint: self.http.endpoint(COMPLETIONS_PATH),
                reason: "response contained no choices".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}
