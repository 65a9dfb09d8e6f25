use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Model provider behind the classifier gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Anthropic,
    /// OpenAI or any host speaking the Chat Completions API
    OpenAi,
}

impl Provider {
    fn api_key_var(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-20250514",
            Provider::OpenAi => "gpt-4.1-2025-04-14",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("anthropic"),
            Provider::OpenAi => f.write_str("openai"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Provider::Anthropic),
            "openai" => Ok(Provider::OpenAi),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Configuration for the classifier gateway and its backend
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub provider: Provider,
    /// API key (from ANTHROPIC_API_KEY or OPENAI_API_KEY)
    pub api_key: String,
    /// Primary model
    pub model: String,
    /// Models tried in order when the previous one is rate limited
    pub fallback_models: Vec<String>,
    /// Sampling temperature; `None` uses the provider default
    pub temperature: Option<f64>,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Extra attempts per model on retryable failures
    pub max_retries: u32,
    /// Backoff before the first retry, doubled per attempt
    pub initial_backoff_ms: u64,
    /// Upper bound for any single backoff
    pub max_backoff_ms: u64,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Cap on concurrent requests; `None` is unbounded
    pub max_in_flight: Option<usize>,
    /// API base URL, without trailing slash
    pub base_url: String,
}

impl OracleConfig {
    /// Create config for a provider with its default model
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            fallback_models: Vec::new(),
            temperature: None,
            max_tokens: 1024,
            max_retries: 2,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            request_timeout_secs: 120,
            max_in_flight: None,
            base_url: provider.default_base_url().to_string(),
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the provider's API key plus the optional `CALLAUDIT_MODEL`,
    /// `CALLAUDIT_FALLBACK_MODELS` (comma separated) and, for OpenAI-compatible
    /// hosts, `OPENAI_BASE_URL`.
    pub fn from_env(provider: Provider) -> Result<Self, ConfigError> {
        let var = provider.api_key_var();
        let api_key = std::env::var(var).map_err(|_| ConfigError::MissingEnv(var.to_string()))?;

        let mut config = Self::new(provider, api_key);

        if let Ok(model) = std::env::var("CALLAUDIT_MODEL") {
            if !model.trim().is_empty() {
                config.model = model.trim().to_string();
            }
        }
        if let Ok(models) = std::env::var("CALLAUDIT_FALLBACK_MODELS") {
            config.fallback_models = parse_model_list(&models);
        }
        if provider == Provider::OpenAi {
            if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }

        Ok(config)
    }

    /// Primary model followed by the fallbacks
    pub fn model_chain(&self) -> Vec<String> {
        std::iter::once(self.model.clone())
            .chain(self.fallback_models.iter().cloned())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Split a comma-separated model list, dropping blanks
pub fn parse_model_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("anthropic".parse::<Provider>(), Ok(Provider::Anthropic));
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert!("mistral".parse::<Provider>().is_err());
    }

    #[test]
    fn test_model_chain() {
        let mut config = OracleConfig::new(Provider::OpenAi, "key");
        config.fallback_models = vec!["gpt-4.1-mini".to_string()];
        assert_eq!(
            config.model_chain(),
            vec!["gpt-4.1-2025-04-14".to_string(), "gpt-4.1-mini".to_string()]
        );
    }

    #[test]
    fn test_parse_model_list() {
        assert_eq!(
            parse_model_list(" gpt-4.1-mini, ,gpt-5-nano "),
            vec!["gpt-4.1-mini".to_string(), "gpt-5-nano".to_string()]
        );
        assert!(parse_model_list("").is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = OracleConfig::new(Provider::Anthropic, "key");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_url, "https://api.anthropic.com/v1");
        assert!(config.fallback_models.is_empty());
        assert!(config.max_in_flight.is_none());
    }
}
