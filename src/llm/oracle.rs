use std::future::Future;

use serde_json::Value;

use crate::error::OracleError;

/// Name of the structured output used for label classification
const LABEL_SCHEMA_NAME: &str = "submit_answer";

/// A JSON schema the oracle's answer must conform to
#[derive(Debug, Clone)]
pub struct StructuredSchema {
    /// Tool / schema name sent to the provider
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl StructuredSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// Schema constraining the answer to one of `labels`
    pub fn label_choice(labels: &[&str]) -> Self {
        Self::new(
            LABEL_SCHEMA_NAME,
            "Submit exactly one of the allowed answers",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "enum": labels
                    }
                },
                "required": ["answer"],
                "additionalProperties": false
            }),
        )
    }
}

/// The external judgment service
///
/// Implementations own transport, retries and fallback; callers only see a
/// label or a structured value.
pub trait Oracle: Send + Sync {
    /// Ask for exactly one of `labels`
    fn classify(
        &self,
        prompt: &str,
        labels: &[&str],
    ) -> impl Future<Output = Result<String, OracleError>> + Send;

    /// Ask for a value matching `schema`
    fn extract(
        &self,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> impl Future<Output = Result<Value, OracleError>> + Send;
}

/// Pull the chosen label out of a [`StructuredSchema::label_choice`] answer
pub fn parse_label(value: &Value, labels: &[&str]) -> Result<String, OracleError> {
    let answer = value
        .get("answer")
        .and_then(Value::as_str)
        .ok_or_else(|| OracleError::InvalidResponse(format!("missing answer field in {value}")))?;

    if labels.contains(&answer) {
        Ok(answer.to_string())
    } else {
        Err(OracleError::UnexpectedLabel {
            label: answer.to_string(),
            allowed: labels.iter().map(|l| l.to_string()).collect(),
        })
    }
}
