//! Client-side request pacing
//!
//! Every request reserves the next free slot on a shared schedule and then
//! sleeps until that slot, outside the lock. Up to `burst` requests may start
//! back to back after a quiet period; after that they are spaced one
//! `interval` apart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, instrument, warn};

use crate::error::Result;

/// Slowest pace a limiter accepts, in requests per second
const MIN_RATE: f64 = 0.01;

/// Largest burst a limiter allows, whatever its rate
const MAX_BURST: f64 = 100.0;

/// Paces requests to a fixed rate; clones share one schedule
#[derive(Clone)]
pub struct RateLimiter {
    /// Theoretical arrival time of the next request
    next_slot: Arc<Mutex<Instant>>,
    interval: Duration,
    tolerance: Duration,
    rate: f64,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` requests per second
    ///
    /// The burst allowance is `rate` rounded down, and never less than one.
    ///
    /// # Example
    ///
    /// ```
    /// use icite_client::rate_limit::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(3.0);
    /// assert_eq!(limiter.rate(), 3.0);
    /// ```
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() || rate < MIN_RATE {
            warn!(rate, minimum = MIN_RATE, "Rate limit too low, clamping");
            MIN_RATE
        } else {
            rate
        };

        let interval = Duration::from_secs_f64(1.0 / rate);
        let burst = rate.floor().clamp(1.0, MAX_BURST) as u32;

        Self {
            next_slot: Arc::new(Mutex::new(Instant::now())),
            interval,
            tolerance: interval * (burst - 1),
            rate,
        }
    }

    /// Limiter for the public iCite API (3 requests/second)
    pub fn icite_default() -> Self {
        Self::new(3.0)
    }

    /// Wait for this request's slot
    ///
    /// Never fails today; the `Result` leaves room for limiters that give up.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<()> {
        let ready_at = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next_slot).max(now);
            *next_slot = slot + self.interval;
            slot.checked_sub(self.tolerance).unwrap_or(now).max(now)
        };

        let now = Instant::now();
        if ready_at > now {
            debug!(wait_ms = (ready_at - now).as_millis(), "Waiting for rate limit slot");
            sleep_until(ready_at).await;
        }
        Ok(())
    }

    /// Whether a request issued now would start without waiting
    pub async fn check_available(&self) -> bool {
        let next_slot = *self.next_slot.lock().await;
        let now = Instant::now();
        next_slot.max(now).checked_sub(self.tolerance).unwrap_or(now) <= now
    }

    /// Configured requests per second
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Spacing between requests once the burst is spent
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
