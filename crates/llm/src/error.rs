use reqwest::StatusCode;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("unexpected response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            LlmError::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            LlmError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}
