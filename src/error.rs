use crate::language::LanguageRole;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{which} language not found: {code}")]
    LanguageNotFound { which: LanguageRole, code: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Translation provider access error: {0}")]
    ProviderAccess(String),

    #[error("Translation provider rejected the request ({status}): {body}")]
    ProviderRejected { status: u16, body: String },

    #[error("Failed to store translation record: {0}")]
    Storage(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Worker pool is shut down")]
    PoolClosed,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelayError {
    /// Whether the whole-operation retry policy should run the pipeline again.
    pub fn is_retryable(&self) -> bool {
        match self {
            RelayError::LanguageNotFound { .. }
            | RelayError::InvalidInput(_)
            | RelayError::PoolClosed
            | RelayError::Config(_) => false,
            // Throttling and request timeouts clear up on their own
            RelayError::ProviderRejected { status, .. } => matches!(status, 408 | 429),
            RelayError::ProviderAccess(_)
            | RelayError::Storage(_)
            | RelayError::Timeout(_)
            | RelayError::Io(_)
            | RelayError::Http(_)
            | RelayError::Json(_) => true,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::LanguageNotFound { .. } => "language_not_found",
            RelayError::InvalidInput(_) => "invalid_input",
            RelayError::ProviderAccess(_) => "provider_access",
            RelayError::ProviderRejected { .. } => "provider_rejected",
            RelayError::Storage(_) => "storage",
            RelayError::Timeout(_) => "timeout",
            RelayError::PoolClosed => "pool_closed",
            RelayError::Config(_) => "config",
            RelayError::Io(_) => "io",
            RelayError::Http(_) => "http",
            RelayError::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
