use serde_json::Value;

use crate::error::OracleError;
use crate::llm::{
    AnthropicClient, ClassifierGateway, ModelBackend, OpenAiClient, OracleConfig, Provider,
    StructuredSchema,
};

/// Network backend chosen by [`OracleConfig::provider`]
pub enum HttpBackend {
    Anthropic(AnthropicClient),
    OpenAi(OpenAiClient),
}

impl HttpBackend {
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        Ok(match config.provider {
            Provider::Anthropic => HttpBackend::Anthropic(AnthropicClient::new(config)?),
            Provider::OpenAi => HttpBackend::OpenAi(OpenAiClient::new(config)?),
        })
    }
}

impl ModelBackend for HttpBackend {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> Result<Value, OracleError> {
        match self {
            HttpBackend::Anthropic(client) => client.complete(model, prompt, schema).await,
            HttpBackend::OpenAi(client) => client.complete(model, prompt, schema).await,
        }
    }
}

/// Gateway over the configured provider
pub type HttpGateway = ClassifierGateway<HttpBackend>;

/// Build the gateway for the configured provider and model chain
pub fn build_gateway(config: &OracleConfig) -> Result<HttpGateway, OracleError> {
    Ok(ClassifierGateway::new(HttpBackend::from_config(config)?, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_follows_provider() {
        let config = OracleConfig::new(Provider::OpenAi, "key");
        assert!(matches!(
            HttpBackend::from_config(&config).unwrap(),
            HttpBackend::OpenAi(_)
        ));

        let mut config = OracleConfig::new(Provider::Anthropic, "key");
        config.fallback_models = vec!["claude-3-5-haiku-latest".to_string()];
        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.models().len(), 2);
    }
}
