//! Tests for the response cache.

use kra_connect_cache::{CacheConfig, CacheConfigBuilder, CacheManager};
use std::time::Duration;

const TTL: Duration = Duration::from_secs(60);

fn cache_with_capacity(max_size: usize) -> CacheManager<&'static str> {
    CacheManager::new(CacheConfig::default().with_max_size(max_size))
}

#[tokio::test(start_paused = true)]
async fn test_get_returns_most_recent_value() {
    let mut cache = cache_with_capacity(10);
    cache.set("k", "first", TTL);
    cache.set("k", "second", TTL);

    assert_eq!(cache.get("k"), Some(&"second"));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_missing_key_is_absent() {
    let mut cache = cache_with_capacity(10);
    assert_eq!(cache.get("never-set"), None);
}

#[tokio::test(start_paused = true)]
async fn test_lru_eviction_protects_recently_read_key() {
    let mut cache = cache_with_capacity(3);
    cache.set("k1", "v1", TTL);
    cache.set("k2", "v2", TTL);
    cache.set("k3", "v3", TTL);

    assert_eq!(cache.get("k1"), Some(&"v1"));
    cache.set("k4", "v4", TTL);

    assert_eq!(cache.len(), 3);
    assert!(!cache.contains_key("k2"));
    for key in ["k1", "k3", "k4"] {
        assert!(cache.contains_key(key), "{key} should remain");
    }
}

#[tokio::test(start_paused = true)]
async fn test_overflow_evicts_exactly_one_entry() {
    let mut cache = cache_with_capacity(3);
    for key in ["a", "b", "c", "d"] {
        cache.set(key, "v", TTL);
    }

    assert_eq!(cache.len(), 3);
    assert!(!cache.contains_key("a"));
}

#[tokio::test(start_paused = true)]
async fn test_replacing_key_does_not_evict() {
    let mut cache = cache_with_capacity(2);
    cache.set("a", "1", TTL);
    cache.set("b", "2", TTL);
    cache.set("a", "3", TTL);

    assert_eq!(cache.len(), 2);
    assert!(cache.contains_key("b"));
    // "a" was refreshed, so "b" is now least recent
    cache.set("c", "4", TTL);
    assert!(!cache.contains_key("b"));
    assert!(cache.contains_key("a"));
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_is_removed_on_read() {
    let mut cache = cache_with_capacity(10);
    cache.set("k", "v", Duration::from_secs(5));

    tokio::time::advance(Duration::from_secs(4)).await;
    assert_eq!(cache.get("k"), Some(&"v"));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get("k"), None);
    assert!(!cache.contains_key("k"));
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stats_do_not_expire_entries() {
    let mut cache = cache_with_capacity(10);
    cache.set("short", "v", Duration::from_secs(1));
    cache.set("long", "v", Duration::from_secs(100));

    tokio::time::advance(Duration::from_secs(2)).await;
    let stats = cache.get_stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.max_size, 10);
    assert_eq!(stats.expired_count, 1);
    assert_eq!(stats.valid_count, 1);

    // Still physically present until read or swept
    assert!(cache.contains_key("short"));
    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.get_stats().size, 1);
}

#[tokio::test(start_paused = true)]
async fn test_remove_pattern_counts_matches() {
    let mut cache = cache_with_capacity(10);
    cache.set("pin_verification:1", "a", TTL);
    cache.set("pin_verification:2", "b", TTL);
    cache.set("tcc_verification:1", "c", TTL);

    let removed = cache.remove_pattern(|key| key.starts_with("pin_verification:"));
    assert_eq!(removed, 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains_key("tcc_verification:1"));

    // Access-order chain stays consistent after bulk removal
    cache.set("x", "1", TTL);
    assert_eq!(cache.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_cache_stores_nothing() {
    let config = CacheConfigBuilder::default().enabled(false).build().unwrap();
    let mut cache: CacheManager<&str> = CacheManager::new(config);
    cache.set("k", "v", TTL);

    assert!(cache.is_empty());
    assert_eq!(cache.get("k"), None);
}

#[tokio::test(start_paused = true)]
async fn test_zero_ttl_stores_nothing() {
    let mut cache = cache_with_capacity(10);
    cache.set("k", "v", Duration::ZERO);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_empties_cache() {
    let mut cache = cache_with_capacity(10);
    cache.set("a", "1", TTL);
    cache.set("b", "2", TTL);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get_stats().valid_count, 0);
}
