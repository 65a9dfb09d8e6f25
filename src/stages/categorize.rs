use crate::error::{AnalysisError, ConfigError};
use crate::llm::{build_category_prompt, Oracle};
use crate::models::CategoryLabel;

/// Classify the (anonymised) transcript into one of `categories`
pub async fn categorize<O: Oracle>(
    oracle: &O,
    text: &str,
    categories: &[CategoryLabel],
) -> Result<CategoryLabel, AnalysisError> {
    if categories.is_empty() {
        return Err(ConfigError::NoCategories.into());
    }

    let prompt = build_category_prompt(text, categories);
    let labels: Vec<&str> = categories.iter().map(CategoryLabel::as_str).collect();
    let label = oracle.classify(&prompt, &labels).await?;

    Ok(CategoryLabel::new(label))
}
