use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::OracleError;
use crate::llm::http::check_response;
use crate::llm::{ModelBackend, OracleConfig, StructuredSchema};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
///
/// Structured output is obtained by forcing a single tool call whose
/// `input_schema` is the requested schema.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    endpoint: String,
    temperature: Option<f64>,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &OracleConfig) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/messages", config.base_url),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(
        &self,
        model: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> AnthropicToolRequest {
        AnthropicToolRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            tools: vec![Tool {
                name: schema.name.clone(),
                description: schema.description.clone(),
                input_schema: schema.schema.clone(),
            }],
            tool_choice: ToolChoice {
                choice_type: "tool".to_string(),
                name: schema.name.clone(),
            },
        }
    }
}

impl ModelBackend for AnthropicClient {
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
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let response: AnthropicResponse = check_response(response, model).await?.json().await?;

        extract_tool_input(response, &schema.name)
    }
}

/// Find the input of the forced tool call
fn extract_tool_input(response: AnthropicResponse, tool_name: &str) -> Result<Value, OracleError> {
    response
        .content
        .into_iter()
        .find(|c| c.content_type == "tool_use" && c.name.as_deref() == Some(tool_name))
        .and_then(|c| c.input)
        .ok_or_else(|| OracleError::InvalidResponse(format!("no {tool_name} tool_use in response")))
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    tool_choice: ToolChoice,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}
