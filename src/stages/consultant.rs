use tracing::info;

use crate::error::AnalysisError;
use crate::llm::{build_consultant_prompt, Oracle};
use crate::models::Transcript;

/// Identify which speaker label belongs to the bank consultant
///
/// The oracle chooses among the transcript's own speaker labels. A single
/// speaker is taken as the consultant without a query; an empty transcript
/// has no consultant.
pub async fn identify_consultant<O: Oracle>(
    oracle: &O,
    transcript: &Transcript,
) -> Result<Option<String>, AnalysisError> {
    let speakers = transcript.speakers();

    match speakers.as_slice() {
        [] => Ok(None),
        [only] => {
            info!(speaker = %only, "Single speaker, taken as consultant");
            Ok(Some(only.to_string()))
        }
        _ => {
            let prompt = build_consultant_prompt(&transcript.render(), &speakers);
            let consultant = oracle.classify(&prompt, &speakers).await?;
            Ok(Some(consultant))
        }
    }
}
