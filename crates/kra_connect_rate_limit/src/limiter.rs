//! Token bucket rate limiter.
//!
//! The bucket starts full with `capacity = max_requests_per_second` tokens and
//! refills continuously at `capacity` tokens per second. Each outbound
//! attempt takes one token.
//!
//! All state lives behind one non-reentrant mutex. Every public method takes
//! the lock exactly once and does its arithmetic on the guarded state; the
//! wait estimate is computed from that same state rather than by calling back
//! into another locked method. The lock is never held across an `.await`.

use crate::RateLimitConfig;
use kra_connect_error::RateLimitError;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Added to every computed wait so the caller wakes after the token exists.
pub const SAFETY_MARGIN: Duration = Duration::from_millis(10);

/// Mutable state of the bucket.
///
/// `tokens` stays within `[0, capacity]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBucketState {
    tokens: f64,
    last_refill: Instant,
    capacity: u32,
}

impl TokenBucketState {
    fn full(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            last_refill: now,
            capacity,
        }
    }

    /// Tokens currently in the bucket (fractional).
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// When tokens were last added.
    pub fn last_refill(&self) -> Instant {
        self.last_refill
    }

    /// Maximum number of tokens.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            let capacity = f64::from(self.capacity);
            self.tokens = (self.tokens + elapsed * capacity).min(capacity);
            self.last_refill = now;
        }
    }

    fn wait_for_token(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            let seconds = (1.0 - self.tokens) / f64::from(self.capacity);
            Duration::from_secs_f64(seconds) + SAFETY_MARGIN
        }
    }

    /// Refill, then take one token or report how long until one exists.
    fn take(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens = (self.tokens - 1.0).max(0.0);
            Ok(())
        } else {
            Err(self.wait_for_token())
        }
    }
}

/// Token bucket limiter bounding outbound request rate.
///
/// One limiter belongs to one client; independently configured clients in
/// the same process each own their own bucket.
///
/// # Example
///
/// ```
/// use kra_connect_rate_limit::{RateLimitConfig, RateLimiter};
///
/// let limiter = RateLimiter::new(RateLimitConfig::default().with_max_requests_per_second(2));
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
/// assert!(limiter.acquire().is_err());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    bucket: Mutex<TokenBucketState>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket.
    ///
    /// A configured rate of zero is treated as one request per second.
    pub fn new(config: RateLimitConfig) -> Self {
        let capacity = (*config.max_requests_per_second()).max(1);
        debug!(capacity, enabled = config.enabled(), "Creating token bucket rate limiter");
        Self {
            bucket: Mutex::new(TokenBucketState::full(capacity, Instant::now())),
            config,
        }
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Run `f` on the bucket inside the single critical section.
    fn with_bucket<R>(&self, f: impl FnOnce(&mut TokenBucketState, Instant) -> R) -> R {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut bucket, Instant::now())
    }

    /// Take a token or fail with the exact wait needed.
    ///
    /// # Errors
    ///
    /// Returns a local `RateLimitError` whose `wait()` is
    /// `(1 - tokens) / capacity` plus [`SAFETY_MARGIN`].
    #[instrument(skip(self))]
    pub fn acquire(&self) -> Result<(), RateLimitError> {
        if !self.config.enabled() {
            return Ok(());
        }
        self.with_bucket(|bucket, now| bucket.take(now))
            .map_err(|wait| {
                debug!(wait_ms = wait.as_millis() as u64, "Token bucket empty");
                RateLimitError::local(wait)
            })
    }

    /// Take a token, suspending until one is available.
    ///
    /// Returns the total time spent waiting.
    #[instrument(skip(self))]
    pub async fn wait_and_acquire(&self) -> Duration {
        if !self.config.enabled() {
            return Duration::ZERO;
        }
        let mut waited = Duration::ZERO;
        loop {
            match self.with_bucket(|bucket, now| bucket.take(now)) {
                Ok(()) => {
                    if !waited.is_zero() {
                        debug!(waited_ms = waited.as_millis() as u64, "Acquired token after waiting");
                    }
                    return waited;
                }
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Waiting for token");
                    tokio::time::sleep(wait).await;
                    waited += wait;
                }
            }
        }
    }

    /// Take a token if one is available. Never fails.
    pub fn try_acquire(&self) -> bool {
        !self.config.enabled() || self.with_bucket(|bucket, now| bucket.take(now)).is_ok()
    }

    /// How long `acquire` would currently ask the caller to wait.
    ///
    /// Does not consume a token.
    pub fn estimated_wait(&self) -> Duration {
        if !self.config.enabled() {
            return Duration::ZERO;
        }
        self.with_bucket(|bucket, now| {
            bucket.refill(now);
            bucket.wait_for_token()
        })
    }

    /// Tokens available right now, after refilling.
    pub fn available_tokens(&self) -> f64 {
        self.with_bucket(|bucket, now| {
            bucket.refill(now);
            bucket.tokens
        })
    }

    /// Copy of the bucket state, without refilling.
    pub fn snapshot(&self) -> TokenBucketState {
        self.with_bucket(|bucket, _| *bucket)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
