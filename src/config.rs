//! Explicit configuration values for the client, the fetcher and the record store
//!
//! Nothing in this crate consults global state: every behavior switch is a
//! field on one of these structs, handed to a constructor.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ICiteError, Result};
use crate::icite::grouper::PercentileThresholds;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryConfig;

/// Default iCite API root
pub const DEFAULT_BASE_URL: &str = "https://icite.od.nih.gov/api";

/// Maximum identifiers per batch request to the iCite service
pub const MAX_BATCH: usize = 1000;

/// HTTP client configuration for [`ICiteClient`](crate::ICiteClient)
///
/// # Example
///
/// ```
/// use icite_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_rate_limit(5.0)
///     .with_timeout(Duration::from_secs(60));
///
/// assert_eq!(config.effective_rate_limit(), 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Custom base URL, mostly for mock servers
    pub base_url: Option<String>,
    /// Custom user agent
    pub user_agent: Option<String>,
    /// Requests per second; `None` uses the iCite default
    pub rate_limit: Option<f64>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry policy for transient failures
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_rate_limit(mut self, rate: f64) -> Self {
        self.rate_limit = Some(rate);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("icite-client/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn effective_rate_limit(&self) -> f64 {
        self.rate_limit.unwrap_or(3.0)
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            rate_limit: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }
}

/// Per-fetcher policy: how large a batch may be and how records are grouped
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    max_batch_size: usize,
    thresholds: PercentileThresholds,
}

impl FetchPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size, which must lie in `1..=MAX_BATCH`
    pub fn with_max_batch_size(mut self, size: usize) -> Result<Self> {
        if size == 0 || size > MAX_BATCH {
            return Err(ICiteError::InvalidBatchSize {
                size,
                maximum: MAX_BATCH,
            });
        }
        self.max_batch_size = size;
        Ok(self)
    }

    pub fn with_thresholds(mut self, thresholds: PercentileThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn thresholds(&self) -> &PercentileThresholds {
        &self.thresholds
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_batch_size: MAX_BATCH,
            thresholds: PercentileThresholds::default(),
        }
    }
}

/// Location of the on-disk record cache
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub directory: PathBuf,
}

impl StoreConfig {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }
}
