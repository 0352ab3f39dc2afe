//! Rate limiting and error recovery.
//!
//! This crate keeps outbound traffic to the verification API within its
//! request budget and recovers from transient failures:
//!
//! - [`RateLimiter`] is a token bucket refilled continuously at
//!   `max_requests_per_second`.
//! - [`RetryHandler`] runs one operation under a per-attempt deadline and
//!   retries transient failures with capped exponential backoff and jitter.
//! - [`parse_retry_after`] extracts the upstream's throttling hint from
//!   response headers.

mod config;
mod detector;
mod limiter;
mod retry;

pub use config::{
    RateLimitConfig, RateLimitConfigBuilder, RateLimitStrategy, RetryConfig, RetryConfigBuilder,
};
pub use detector::parse_retry_after;
pub use limiter::{RateLimiter, TokenBucketState, SAFETY_MARGIN};
pub use retry::{BackoffSchedule, Classification, RetryContext, RetryHandler};
