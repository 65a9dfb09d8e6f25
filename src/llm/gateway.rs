use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, warn};

use crate::error::OracleError;
use crate::llm::{parse_label, OracleConfig, Oracle, StructuredSchema};

/// A single provider endpoint answering one structured request for one model
///
/// Backends do no retrying of their own; [`ClassifierGateway`] owns that.
pub trait ModelBackend: Send + Sync {
    fn complete(
        &self,
        model: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> impl Future<Output = Result<Value, OracleError>> + Send;
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts per model after the first
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (0-based), honouring `Retry-After`
    pub fn backoff(&self, attempt: u32, error: &OracleError) -> Duration {
        let delay = match error.retry_after_secs() {
            Some(secs) => Duration::from_secs(secs),
            None => self.initial_backoff.saturating_mul(1u32 << attempt.min(16)),
        };
        delay.min(self.max_backoff)
    }
}

/// The classifier gateway: one retry/fallback strategy over any backend
///
/// Each model in the chain gets `max_retries` extra attempts on retryable
/// failures. When a model is still rate limited after that, the next model in
/// the chain is tried; every other failure propagates immediately.
pub struct ClassifierGateway<B> {
    backend: B,
    models: Vec<String>,
    policy: RetryPolicy,
    limiter: Option<Semaphore>,
}

impl<B: ModelBackend> ClassifierGateway<B> {
    pub fn new(backend: B, config: &OracleConfig) -> Self {
        Self {
            backend,
            models: config.model_chain(),
            policy: RetryPolicy::from_config(config),
            limiter: config.max_in_flight.map(|n| Semaphore::new(n.max(1))),
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Slot in the `max_in_flight` budget, held for one attempt only
    async fn acquire(&self) -> Result<Option<SemaphorePermit<'_>>, OracleError> {
        match &self.limiter {
            Some(limiter) => limiter
                .acquire()
                .await
                .map(Some)
                .map_err(|_| OracleError::InvalidRequest("request limiter closed".to_string())),
            None => Ok(None),
        }
    }

    async fn request(&self, prompt: &str, schema: &StructuredSchema) -> Result<Value, OracleError> {
        let mut last_error = None;

        for (index, model) in self.models.iter().enumerate() {
            match self.request_with_retries(model, prompt, schema).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limit() && index + 1 < self.models.len() => {
                    warn!(
                        model = %model,
                        fallback = %self.models[index + 1],
                        "Rate limit exceeded, falling back"
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| OracleError::InvalidRequest("no models configured".to_string())))
    }

    async fn request_with_retries(
        &self,
        model: &str,
        prompt: &str,
        schema: &StructuredSchema,
    ) -> Result<Value, OracleError> {
        let mut attempt = 0;

        loop {
            let result = {
                let _permit = self.acquire().await?;
                debug!(model = %model, schema = %schema.name, attempt, "Sending oracle request");
                self.backend.complete(model, prompt, schema).await
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt, &e);
                    warn!(
                        model = %model,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Oracle request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<B: ModelBackend> Oracle for ClassifierGateway<B> {
    async fn classify(&self, prompt: &str, labels: &[&str]) -> Result<String, OracleError> {
        if labels.is_empty() {
            return Err(OracleError::InvalidRequest(
                "classification needs at least one label".to_string(),
            ));
        }

        let schema = StructuredSchema::label_choice(labels);
        let value = self.request(prompt, &schema).await?;
        parse_label(&value, labels)
    }

    async fn extract(&self, prompt: &str, schema: &StructuredSchema) -> Result<Value, OracleError> {
        self.request(prompt, schema).await
    }
}
