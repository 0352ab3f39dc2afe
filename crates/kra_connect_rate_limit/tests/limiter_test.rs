//! Tests for the token bucket limiter.

use kra_connect_rate_limit::{RateLimitConfig, RateLimitConfigBuilder, RateLimiter, SAFETY_MARGIN};
use std::sync::Arc;
use std::time::Duration;

fn limiter(rate: u32) -> RateLimiter {
    RateLimiter::new(RateLimitConfig::default().with_max_requests_per_second(rate))
}

fn drain(limiter: &RateLimiter) -> u32 {
    let mut taken = 0;
    while limiter.try_acquire() {
        taken += 1;
    }
    taken
}

#[tokio::test(start_paused = true)]
async fn test_bucket_starts_full() {
    let limiter = limiter(5);
    assert_eq!(limiter.available_tokens(), 5.0);
    assert_eq!(drain(&limiter), 5);
}

#[tokio::test(start_paused = true)]
async fn test_drained_bucket_reports_wait() {
    let limiter = limiter(10);
    drain(&limiter);

    let wait = limiter.estimated_wait();
    assert_eq!(wait, Duration::from_millis(100) + SAFETY_MARGIN);

    let err = limiter.acquire().unwrap_err();
    assert!(!err.is_upstream());
    assert_eq!(err.wait(), wait);

    tokio::time::advance(wait).await;
    assert!(limiter.acquire().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_wait_and_acquire_suspends_until_token() {
    let limiter = limiter(10);
    drain(&limiter);

    let start = tokio::time::Instant::now();
    let waited = limiter.wait_and_acquire().await;
    let elapsed = start.elapsed();

    assert!(waited >= Duration::from_millis(100), "waited {waited:?}");
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed <= Duration::from_millis(100) + SAFETY_MARGIN * 2);
}

#[tokio::test(start_paused = true)]
async fn test_refill_is_capped_at_capacity() {
    let limiter = limiter(4);
    drain(&limiter);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(limiter.available_tokens(), 4.0);
    assert_eq!(limiter.snapshot().capacity(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_partial_refill() {
    let limiter = limiter(10);
    drain(&limiter);

    tokio::time::advance(Duration::from_millis(250)).await;
    let tokens = limiter.available_tokens();
    assert!((tokens - 2.5).abs() < 1e-9, "tokens = {tokens}");
    assert!(limiter.try_acquire());
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn test_tokens_stay_within_bounds() {
    let limiter = limiter(3);
    for step in 0..200u64 {
        match step % 4 {
            0 => {
                let _ = limiter.try_acquire();
            }
            1 => {
                let _ = limiter.acquire();
            }
            2 => tokio::time::advance(Duration::from_millis(step * 7 % 500)).await,
            _ => {
                let _ = limiter.estimated_wait();
            }
        }
        let tokens = limiter.snapshot().tokens();
        assert!((0.0..=3.0).contains(&tokens), "tokens out of range: {tokens}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_disabled_limiter_never_blocks() {
    let config = RateLimitConfigBuilder::default()
        .enabled(false)
        .max_requests_per_second(1u32)
        .build()
        .unwrap();
    let limiter = RateLimiter::new(config);
    for _ in 0..100 {
        assert!(limiter.try_acquire());
    }
    assert!(limiter.acquire().is_ok());
    assert_eq!(limiter.wait_and_acquire().await, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_waiters_each_take_one_token() {
    let limiter = Arc::new(limiter(5));
    drain(&limiter);

    let start = tokio::time::Instant::now();
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.wait_and_acquire().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    // Five tokens at five per second take about a second to accumulate
    assert!(start.elapsed() >= Duration::from_millis(800));
    assert!(limiter.snapshot().tokens() < 1.0);
}

#[test]
fn test_zero_rate_is_rejected_by_validation() {
    let config = RateLimitConfig::default().with_max_requests_per_second(0);
    assert!(config.validate().is_err());
    assert!(RateLimitConfig::default().validate().is_ok());
}
