//! Test utilities for KRA Connect tests.
//!
//! Provides a scripted mock transport and config helpers.

#![allow(dead_code)]

mod mock_transport;

pub use mock_transport::{MockBehavior, MockTransport};

use kra_connect::{KraClient, KraConnectConfig, RateLimitConfig, RetryConfig};
use std::sync::Arc;

/// Config with short, deterministic backoff and a generous rate limit.
pub fn fast_config() -> KraConnectConfig {
    KraConnectConfig::default()
        .with_retry(
            RetryConfig::default()
                .with_max_retries(3)
                .with_initial_delay_ms(10)
                .with_max_delay_ms(100)
                .with_jitter(false)
                .with_attempt_timeout_ms(5_000)
                .with_default_retry_after_secs(5),
        )
        .with_rate_limit(RateLimitConfig::default().with_max_requests_per_second(100))
}

/// Client over `transport` with `config`.
pub fn client_with(config: KraConnectConfig, transport: Arc<MockTransport>) -> KraClient {
    KraClient::builder()
        .config(config)
        .shared_transport(transport)
        .build()
        .expect("Failed to build test client")
}
