//! Response caching with TTL and LRU eviction.
//!
//! This crate provides the in-process cache that sits in front of the
//! verification endpoints, so repeated lookups of the same identifier do not
//! spend rate-limit tokens or network round trips.

#![warn(missing_docs)]

mod cache;

pub use cache::{CacheConfig, CacheConfigBuilder, CacheEntry, CacheManager, CacheStats};
