//! Error types for call analysis

use thiserror::Error;

/// Failures from the classifier gateway and its model backends
#[derive(Debug, Error)]
pub enum OracleError {
    /// The provider rejected the request because of a rate limit
    #[error("rate limited by {model}: {message}")]
    RateLimited {
        model: String,
        message: String,
        /// Seconds from the `Retry-After` header, when present
        retry_after_secs: Option<u64>,
    },

    /// The provider returned a non-success status
    #[error("API error ({status}) from {model}: {message}")]
    Api {
        model: String,
        status: u16,
        message: String,
    },

    /// Connection, timeout or body decoding failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response did not carry the structured output we asked for
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The answer decoded fine but is not one of the allowed labels
    #[error("oracle answered {label:?}, expected one of {allowed:?}")]
    UnexpectedLabel { label: String, allowed: Vec<String> },

    /// The request could not be built (e.g. empty label set)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl OracleError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, OracleError::RateLimited { .. })
    }

    /// Whether another attempt against the same model may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::RateLimited { .. } | OracleError::Transport(_) => true,
            // 529 is Anthropic's "overloaded"
            OracleError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-requested delay before retrying
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            OracleError::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Invalid configuration or checklist data; never retried
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tries must be at least 1, got {0}")]
    InvalidTries(u32),

    #[error("malformed checklist: {0}")]
    MalformedChecklist(String),

    #[error("no categories to classify into")]
    NoCategories,

    #[error("{0} environment variable not set")]
    MissingEnv(String),
}

/// The classified category has no checklist
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no checklist for category {0:?}")]
pub struct UnknownCategoryError(pub String);

/// Failures of the speech-to-text collaborator
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("audio file not found: {0}")]
    AudioNotFound(String),

    #[error("failed to start transcriber {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcriber exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("malformed transcriber output: {reason}")]
    MalformedOutput { reason: String, stdout: String },
}

/// Fatal failure of an analysis request
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}
