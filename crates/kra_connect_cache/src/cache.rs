//! Response cache implementation.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry with value, expiry and recency.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    last_accessed: Instant,
    #[getter(skip)]
    sequence: u64,
}

impl<V> CacheEntry<V> {
    /// Check if this entry is expired at `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.expires_at.checked_duration_since(Instant::now())
    }
}

/// Configuration for the response cache.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters, derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct CacheConfig {
    /// Maximum cache size (number of entries)
    #[serde(default = "default_max_size")]
    #[builder(default = "default_max_size()")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,
}

fn default_max_size() -> usize {
    1000
}

fn default_enabled() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

/// Point-in-time view of the cache, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Entries currently stored, expired or not
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Stored entries whose TTL has passed
    pub expired_count: usize,
    /// Stored entries still servable
    pub valid_count: usize,
}

/// Bounded cache keyed by request fingerprint.
///
/// Expired entries are removed lazily when read. Recency is tracked as an
/// access-order chain: every insert or hit moves the key to the tail, and an
/// insert that pushes the size past `max_size` evicts the head.
///
/// The cache itself is not synchronized; owners wrap it in a mutex so each
/// method call is one critical section.
///
/// # Example
///
/// ```
/// use kra_connect_cache::{CacheConfig, CacheManager};
/// use std::time::Duration;
///
/// let mut cache = CacheManager::new(CacheConfig::default());
/// cache.set("pin_verification:abc", 42, Duration::from_secs(60));
///
/// assert_eq!(cache.get("pin_verification:abc"), Some(&42));
/// assert_eq!(cache.remove_pattern(|key| key.starts_with("pin_verification:")), 1);
/// ```
#[derive(Debug)]
pub struct CacheManager<V> {
    config: CacheConfig,
    entries: HashMap<String, CacheEntry<V>>,
    access_order: BTreeMap<u64, String>,
    next_sequence: u64,
}

impl<V> CacheManager<V> {
    /// Create a new cache with configuration.
    pub fn new(config: CacheConfig) -> Self {
        tracing::debug!(
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating new CacheManager"
        );
        Self {
            config,
            entries: HashMap::new(),
            access_order: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up `key`.
    ///
    /// Returns None if:
    /// - Entry doesn't exist
    /// - Entry is expired (it is removed on this call)
    /// - Cache is disabled
    ///
    /// A hit moves the entry to the most-recently-used position.
    #[tracing::instrument(skip(self), fields(cache_size = self.entries.len()))]
    pub fn get(&mut self, key: &str) -> Option<&V> {
        if !self.config.enabled {
            return None;
        }

        let now = Instant::now();
        let expired = self.entries.get(key)?.is_expired_at(now);
        if expired {
            tracing::debug!("Cache entry expired, removing");
            self.remove(key);
            return None;
        }

        let sequence = self.bump_sequence();
        let entry = self.entries.get_mut(key)?;
        self.access_order.remove(&entry.sequence);
        self.access_order.insert(sequence, key.to_string());
        entry.sequence = sequence;
        entry.last_accessed = now;

        tracing::debug!(time_remaining = ?entry.time_remaining(), "Cache hit");
        Some(&entry.value)
    }

    /// Insert `value` under `key` for `ttl`.
    ///
    /// Replacing an existing key refreshes its TTL and recency. A zero TTL
    /// stores nothing.
    #[tracing::instrument(skip(self, key, value), fields(cache_size = self.entries.len()))]
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        if !self.config.enabled {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }
        if ttl.is_zero() {
            tracing::debug!("Zero TTL, skipping insert");
            return;
        }

        let key = key.into();
        let now = Instant::now();
        let sequence = self.bump_sequence();
        let entry = CacheEntry {
            value,
            expires_at: now + ttl,
            last_accessed: now,
            sequence,
        };

        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            self.access_order.remove(&previous.sequence);
        }
        self.access_order.insert(sequence, key);

        if self.entries.len() > self.config.max_size {
            self.evict_lru();
        }
    }

    /// Remove one entry, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.access_order.remove(&entry.sequence);
        Some(entry.value)
    }

    /// Remove every entry whose key satisfies `predicate`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_pattern(&mut self, predicate: impl Fn(&str) -> bool) -> usize {
        let before = self.entries.len();
        let access_order = &mut self.access_order;
        self.entries.retain(|key, entry| {
            let keep = !predicate(key);
            if !keep {
                access_order.remove(&entry.sequence);
            }
            keep
        });
        let removed = before - self.entries.len();
        tracing::debug!(removed, remaining = self.entries.len(), "Removed matching cache entries");
        removed
    }

    /// Remove expired entries from cache.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let removed = self.remove_pattern_entries(|entry| entry.is_expired_at(now));
        if removed > 0 {
            tracing::info!(removed, remaining = self.entries.len(), "Cleaned up expired cache entries");
        }
        removed
    }

    /// Clear all cache entries.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.access_order.clear();
        tracing::info!(cleared = count, "Cleared cache");
    }

    /// Get number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is stored, without touching recency or expiring it.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot counts without expiring or reordering anything.
    pub fn get_stats(&self) -> CacheStats {
        let now = Instant::now();
        let expired_count = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();
        CacheStats {
            size: self.entries.len(),
            max_size: self.config.max_size,
            expired_count,
            valid_count: self.entries.len() - expired_count,
        }
    }

    fn remove_pattern_entries(&mut self, predicate: impl Fn(&CacheEntry<V>) -> bool) -> usize {
        let before = self.entries.len();
        let access_order = &mut self.access_order;
        self.entries.retain(|_, entry| {
            let keep = !predicate(entry);
            if !keep {
                access_order.remove(&entry.sequence);
            }
            keep
        });
        before - self.entries.len()
    }

    fn bump_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Evict least recently used entry.
    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.access_order.pop_first() {
            tracing::debug!(key = %key, "Evicting LRU entry");
            self.entries.remove(&key);
        }
    }
}

impl<V> Default for CacheManager<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
