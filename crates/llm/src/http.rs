use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::LlmError;
use crate::retry::RetryPolicy;

/// Authenticated JSON transport shared by the completion, chat and embedding clients.
#[derive(Clone)]
pub(crate) struct OpenAiHttp {
    client: reqwest::Client,
    config: ApiConfig,
    retry: RetryPolicy,
}

impl OpenAiHttp {
    pub(crate) fn new(config: ApiConfig, retry: RetryPolicy) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| LlmError::InvalidApiKey)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(LlmError::Client)?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        self.config.endpoint(path)
    }

    /// POST `body` to `path` under the configured base URL, retrying transient failures.
    pub(crate) async fn post_json<T>(&self, path: &str, body: &T) -> Result<Value, LlmError>
    where
        T: Serialize + ?Sized,
    {
        let endpoint = self.endpoint(path);
        let endpoint = endpoint.as_str();
        debug!(endpoint, "sending request");
        self.retry
            .retry(path, || self.send_once(endpoint, body))
            .await
    }

    async fn send_once<T>(&self, endpoint: &str, body: &T) -> Result<Value, LlmError>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(endpoint)
            .json(body)
            .send()
            .await
            .map_err(|source| LlmError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(LlmError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| LlmError::Malformed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            })
    }
}
