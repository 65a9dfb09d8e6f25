use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OracleError;
use crate::llm::http::check_response;
use crate::llm::{ModelBackend, OracleConfig, StructuredSchema};

/// Client for OpenAI and OpenAI-compatible Chat Completions hosts
///
/// Structured output uses `response_format: json_schema` in strict mode.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    temperature: Option<f64>,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(&self, model: &str, prompt: &str, schema: &StructuredSchema) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_completion_tokens: self.max_tokens,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    schema: schema.schema.clone(),
                    strict: true,
                },
            },
        }
    }
}

impl ModelBackend for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> Result<Value, OracleError> {
        let request = self.build_request(model, prompt, schema);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let response: ChatResponse = check_response(response, model).await?.json().await?;

        parse_message_content(response)
    }
}

/// Decode the JSON document in the first choice's message
fn parse_message_content(response: ChatResponse) -> Result<Value, OracleError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| OracleError::InvalidResponse("no choices in response".to_string()))?;

    if let Some(refusal) = message.refusal {
        return Err(OracleError::InvalidResponse(format!("model refused: {refusal}")));
    }

    let content = message
        .content
        .ok_or_else(|| OracleError::InvalidResponse("empty message content".to_string()))?;

    serde_json::from_str(&content)
        .map_err(|e| OracleError::InvalidResponse(format!("content is not JSON: {e}")))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    max_completion_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    description: String,
    schema: Value,
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
