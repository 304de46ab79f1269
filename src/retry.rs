//! Retry with exponential backoff for transient iCite API failures
//!
//! Retries run through `tokio-retry` (`RetryIf` and its jitter); this module
//! computes the doubling delay schedule, decides which errors are worth
//! retrying and logs each attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::jitter;
use tracing::warn;

/// Errors that can tell whether a retry might succeed
pub trait RetryableError {
    /// Whether the failure is transient
    fn is_retryable(&self) -> bool;

    /// Short human-readable reason, used in log output
    fn retry_reason(&self) -> &str;
}

/// Retry policy for API requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Randomize delays to avoid synchronized retries
    pub use_jitter: bool,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable retries entirely
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Delays between attempts: initial, 2x initial, 4x initial, ... capped at `max_delay`
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let max_delay = self.max_delay;
        let use_jitter = self.use_jitter;
        std::iter::successors(Some(self.initial_delay), |delay| Some(delay.saturating_mul(2)))
            .map(move |delay| delay.min(max_delay))
            .map(move |delay| if use_jitter { jitter(delay) } else { delay })
            .take(self.max_retries)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            use_jitter: true,
        }
    }
}

/// Run `operation`, retrying retryable failures according to `config`
///
/// Non-retryable errors are returned immediately. After the retry budget is
/// exhausted the last error is returned.
pub async fn with_retry<F, Fut, T, E>(operation: F, config: &RetryConfig, context: &str) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    RetryIf::spawn(config.delays(), operation, |err: &E| {
        let retry = err.is_retryable();
        if retry {
            warn!(
                context = context,
                reason = err.retry_reason(),
                error = %err,
                "Retrying after transient failure"
            );
        }
        retry
    })
    .await
}
