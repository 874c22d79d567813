use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found")]
    MissingApiKey(&'static str),
}

/// Connection settings shared by every model client.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    /// `None` keeps the HTTP client's default.
    pub timeout: Option<Duration>,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the process environment. Must run before any client is built.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_VAR))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
        {
            config.base_url = base_url;
        }

        Ok(config)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_fails() {
        let result = ApiConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::MissingApiKey(API_KEY_VAR));
    }

    #[test]
    fn test_blank_api_key_fails() {
        let result = ApiConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "   ")]));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "OPENAI_API_KEY not found");
    }

    #[test]
    fn test_defaults_and_override() {
        let config = ApiConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        let config = ApiConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "sk-test"),
            (BASE_URL_VAR, "http://localhost:8080/v1/"),
        ]))
        .unwrap();
        assert_eq!(
            config.endpoint("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ApiConfig::new("sk-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
    }
}
