//! KRA Connect - resilient client for KRA tax verification APIs.
//!
//! Turns the verification endpoints (PIN, tax compliance certificate,
//! e-slip, nil return filing, taxpayer details) into validated, cached,
//! rate-limited and retried calls.
//!
//! # Quick Start
//!
//! ```no_run
//! use kra_connect::{KraClient, KraConnectConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     kra_connect::init_tracing()?;
//!     let client = KraClient::builder()
//!         .config(KraConnectConfig::load()?)
//!         .bearer_token_from_env()?
//!         .build()?;
//!
//!     let results = client.verify_pins_batch(&["P051234567A", "P051234568B"]).await;
//!     for result in results {
//!         match result {
//!             Ok(found) => println!("{}: valid={}", found.data().pin(), found.data().is_valid()),
//!             Err(e) => eprintln!("{e}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `kra_connect_error` - Error taxonomy
//! - `kra_connect_core` - Operations, fingerprints, records, validation
//! - `kra_connect_cache` - LRU cache with TTL expiry
//! - `kra_connect_rate_limit` - Token bucket and retry with backoff
//! - `kra_connect_interface` - Transport trait
//! - `kra_connect_http` - reqwest transport
//!
//! This crate ties them together and re-exports them.

mod client;
mod config;
mod pipeline;

pub use client::{API_KEY_ENV, KraClient, KraClientBuilder};
pub use config::{BatchConfig, CacheSettings, KraConnectConfig};
pub use pipeline::{PipelineStage, RequestPipeline};

pub use kra_connect_cache::{CacheConfig, CacheStats};
pub use kra_connect_core::*;
pub use kra_connect_error::*;
pub use kra_connect_http::{HttpConfig, HttpTransport};
pub use kra_connect_interface::{TransportRequest, TransportResponse, VerificationTransport};
pub use kra_connect_rate_limit::{RateLimitConfig, RateLimitStrategy, RetryConfig};
