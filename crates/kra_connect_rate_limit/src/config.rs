//! Configuration structures for rate limiting and retry.
//!
//! Both structs deserialize from the `[rate_limit]` and `[retry]` tables of
//! the client configuration; every field has a default so partial tables are
//! valid.

use derive_getters::Getters;
use kra_connect_error::{ConfigError, KraResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the pipeline does when the local bucket is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    /// Suspend the caller until a token is available
    #[default]
    Wait,
    /// Fail immediately with a `RateLimitError` carrying the wait estimate
    FailFast,
}

/// Token bucket configuration.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// enabled = true
/// max_requests_per_second = 10
/// strategy = "wait"
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters, derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct RateLimitConfig {
    /// Whether outbound requests are throttled at all
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,

    /// Bucket capacity and refill rate (tokens per second)
    #[serde(default = "default_max_requests_per_second")]
    #[builder(default = "default_max_requests_per_second()")]
    max_requests_per_second: u32,

    /// Behaviour when the bucket is empty
    #[serde(default)]
    #[builder(default)]
    strategy: RateLimitStrategy,
}

fn default_enabled() -> bool {
    true
}

fn default_max_requests_per_second() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_requests_per_second: default_max_requests_per_second(),
            strategy: RateLimitStrategy::default(),
        }
    }
}

impl RateLimitConfig {
    /// Reject configurations that would never admit a request.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the rate is zero.
    pub fn validate(&self) -> KraResult<()> {
        if self.max_requests_per_second == 0 {
            Err(ConfigError::new("rate_limit.max_requests_per_second must be at least 1"))?
        }
        Ok(())
    }
}

/// Retry and backoff configuration.
///
/// The delay before attempt `n` (n ≥ 2) is
/// `min(max_delay, initial_delay * 2^(n-2))`, plus up to 10% jitter.
///
/// # Example
///
/// ```toml
/// [retry]
/// max_retries = 3
/// initial_delay_ms = 1000
/// max_delay_ms = 32000
/// jitter = true
/// attempt_timeout_ms = 30000
/// retryable_status_codes = [408, 429, 500, 502, 503, 504]
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters, derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    #[builder(default = "default_max_retries()")]
    max_retries: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(default = "default_initial_delay_ms")]
    #[builder(default = "default_initial_delay_ms()")]
    initial_delay_ms: u64,

    /// Upper bound on any backoff delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    #[builder(default = "default_max_delay_ms()")]
    max_delay_ms: u64,

    /// Add up to 10% random delay to each backoff
    #[serde(default = "default_jitter")]
    #[builder(default = "default_jitter()")]
    jitter: bool,

    /// Deadline for a single attempt (milliseconds)
    #[serde(default = "default_attempt_timeout_ms")]
    #[builder(default = "default_attempt_timeout_ms()")]
    attempt_timeout_ms: u64,

    /// HTTP statuses treated as transient in addition to the built-in rules
    #[serde(default = "default_retryable_status_codes")]
    #[builder(default = "default_retryable_status_codes()")]
    retryable_status_codes: Vec<u16>,

    /// Wait applied after a 429 without a `Retry-After` hint (seconds)
    #[serde(default = "default_retry_after_secs")]
    #[builder(default = "default_retry_after_secs()")]
    default_retry_after_secs: u64,

    /// Cap on any upstream `Retry-After` hint (seconds)
    #[serde(default = "default_max_retry_after_secs")]
    #[builder(default = "default_max_retry_after_secs()")]
    max_retry_after_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    32_000
}

fn default_jitter() -> bool {
    true
}

fn default_attempt_timeout_ms() -> u64 {
    30_000
}

fn default_retryable_status_codes() -> Vec<u16> {
    vec![408, 429, 500, 502, 503, 504]
}

fn default_retry_after_secs() -> u64 {
    60
}

fn default_max_retry_after_secs() -> u64 {
    300
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            retryable_status_codes: default_retryable_status_codes(),
            default_retry_after_secs: default_retry_after_secs(),
            max_retry_after_secs: default_max_retry_after_secs(),
        }
    }
}

impl RetryConfig {
    /// A configuration that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Upper bound on backoff delays.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Deadline for one attempt.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Wait applied after a 429 without a hint.
    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    /// Cap on upstream hints.
    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }

    /// Total attempts, counting the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Un-jittered delay before `attempt` (1-based).
    ///
    /// Zero for the first attempt; `min(max_delay, initial_delay * 2^(attempt-2))`
    /// afterwards.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(63);
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(1u64.checked_shl(exponent).unwrap_or(u64::MAX));
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Reject inconsistent settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the initial delay exceeds the cap or the
    /// attempt timeout is zero.
    pub fn validate(&self) -> KraResult<()> {
        if self.initial_delay_ms > self.max_delay_ms {
            Err(ConfigError::new(format!(
                "retry.initial_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            )))?
        }
        if self.attempt_timeout_ms == 0 {
            Err(ConfigError::new("retry.attempt_timeout_ms must be positive"))?
        }
        Ok(())
    }
}
