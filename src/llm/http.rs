//! Shared HTTP response handling for model backends.
//!
//! Maps provider status codes onto [`OracleError`] so the gateway can tell a
//! rate limit (retry, then fall back) from any other failure.

use crate::error::OracleError;

/// Marker OpenAI puts in 429 bodies when the account is out of credit
const QUOTA_EXHAUSTED: &str = "insufficient_quota";

/// Check a provider response for error statuses
///
/// - **429** → [`OracleError::RateLimited`] with the `Retry-After` seconds,
///   unless the body reports quota exhaustion, which no retry can fix.
/// - **Other non-success** → [`OracleError::Api`] with status and body.
pub async fn check_response(
    resp: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, OracleError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let retry_after_secs = parse_retry_after(&resp);
    let message = resp.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS && !message.contains(QUOTA_EXHAUSTED) {
        return Err(OracleError::RateLimited {
            model: model.to_string(),
            message,
            retry_after_secs,
        });
    }

    Err(OracleError::Api {
        model: model.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Parse the `Retry-After` header as whole seconds
fn parse_retry_after(resp: &reqwest::Response) -> Option<u64> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
