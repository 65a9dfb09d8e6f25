use serde::Deserialize;
use tracing::debug;

use crate::error::{AnalysisError, OracleError};
use crate::llm::{build_evidence_prompt, quote_schema, Oracle};
use crate::models::ChecklistQuestion;

#[derive(Debug, Deserialize)]
struct EvidenceQuote {
    quote: String,
}

/// Ask the oracle to quote the passage that addresses `question`
///
/// The quote is returned as given. It is not checked against `text`; a quote
/// that is not a verbatim substring is only logged.
pub async fn extract_evidence<O: Oracle>(
    oracle: &O,
    question: &ChecklistQuestion,
    text: &str,
) -> Result<String, AnalysisError> {
    let prompt = build_evidence_prompt(question, text);
    let value = oracle.extract(&prompt, &quote_schema()).await?;

    let EvidenceQuote { quote } = serde_json::from_value(value)
        .map_err(|e| OracleError::InvalidResponse(format!("malformed quote: {e}")))?;

    if !text.contains(quote.as_str()) {
        debug!(question = %question.id, "Extracted quote is not a verbatim passage");
    }

    Ok(quote)
}
