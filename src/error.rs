use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Error types for iCite client operations
#[derive(Error, Debug)]
pub enum ICiteError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The service has no record for this identifier
    #[error("Article not found: PMID {pmid}")]
    ArticleNotFound { pmid: u32 },

    /// Invalid PMID format
    #[error("Invalid PMID format: {pmid}")]
    InvalidPmid { pmid: String },

    /// Relation tag outside {cited_by, cited_by_clin, references}
    #[error("Unknown relation tag: {tag}")]
    InvalidRelation { tag: String },

    /// Batch size outside 1..=maximum
    #[error("Invalid batch size {size}: must be between 1 and {maximum}")]
    InvalidBatchSize { size: usize, maximum: usize },

    /// An unbatched identifier list was handed to the service
    #[error("Batch too large: requested {requested} identifiers, maximum is {maximum}")]
    BatchTooLarge { requested: usize, maximum: usize },

    /// Percentile cut points are not finite and strictly increasing
    #[error("Invalid percentile thresholds: {message}")]
    InvalidThresholds { message: String },

    /// API rate limit exceeded
    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    /// Generic API error with HTTP status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// A cached entry exists but cannot be decoded
    #[error("Unreadable cache entry for PMID {pmid}: {message}")]
    CacheReadError { pmid: u32, message: String },

    /// IO error for file operations
    #[error("IO error: {message}")]
    IoError { message: String },
}

pub type Result<T> = result::Result<T, ICiteError>;

impl ICiteError {
    /// Configuration errors abort a call immediately and are never tolerated
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ICiteError::InvalidPmid { .. }
                | ICiteError::InvalidRelation { .. }
                | ICiteError::InvalidBatchSize { .. }
                | ICiteError::BatchTooLarge { .. }
                | ICiteError::InvalidThresholds { .. }
        )
    }

    /// Transport or remote-service failures, tolerated per batch by the fetcher
    pub fn is_service_error(&self) -> bool {
        matches!(
            self,
            ICiteError::RequestError(_)
                | ICiteError::JsonError(_)
                | ICiteError::ArticleNotFound { .. }
                | ICiteError::RateLimitExceeded
                | ICiteError::ApiError { .. }
        )
    }
}

impl From<std::io::Error> for ICiteError {
    fn from(err: std::io::Error) -> Self {
        ICiteError::IoError {
            message: err.to_string(),
        }
    }
}

impl RetryableError for ICiteError {
    fn is_retryable(&self) -> bool {
        match self {
            ICiteError::RequestError(err) => {
                if err.is_timeout() || err.is_connect() {
                    return true;
                }

                if let Some(status) = err.status() {
                    return status.is_server_error() || status.as_u16() == 429;
                }

                // DNS and other network errors
                !err.is_builder() && !err.is_redirect() && !err.is_decode()
            }

            ICiteError::RateLimitExceeded => true,

            ICiteError::ApiError { status, message } => {
                (*status >= 500 && *status < 600) || *status == 429 || {
                    let lower_msg = message.to_lowercase();
                    lower_msg.contains("temporarily unavailable")
                        || lower_msg.contains("timeout")
                        || lower_msg.contains("connection")
                }
            }

            ICiteError::JsonError(_)
            | ICiteError::ArticleNotFound { .. }
            | ICiteError::InvalidPmid { .. }
            | ICiteError::InvalidRelation { .. }
            | ICiteError::InvalidBatchSize { .. }
            | ICiteError::BatchTooLarge { .. }
            | ICiteError::InvalidThresholds { .. }
            | ICiteError::CacheReadError { .. }
            | ICiteError::IoError { .. } => false,
        }
    }

    fn retry_reason(&self) -> &str {
        if self.is_retryable() {
            match self {
                ICiteError::RequestError(err) if err.is_timeout() => "Request timeout",
                ICiteError::RequestError(err) if err.is_connect() => "Connection error",
                ICiteError::RequestError(_) => "Network error",
                ICiteError::RateLimitExceeded => "Rate limit exceeded",
                ICiteError::ApiError { status, .. } => match status {
                    429 => "Rate limit exceeded",
                    500..=599 => "Server error",
                    _ => "Temporary API error",
                },
                _ => "Transient error",
            }
        } else {
            match self {
                ICiteError::JsonError(_) => "Invalid JSON response",
                ICiteError::ArticleNotFound { .. } => "Article does not exist",
                ICiteError::InvalidPmid { .. } => "Invalid input",
                ICiteError::InvalidRelation { .. }
                | ICiteError::InvalidBatchSize { .. }
                | ICiteError::BatchTooLarge { .. }
                | ICiteError::InvalidThresholds { .. } => "Invalid configuration",
                ICiteError::CacheReadError { .. } => "Corrupt cache entry",
                ICiteError::IoError { .. } => "File system error",
                _ => "Non-transient error",
            }
        }
    }
}
