//! Error types for the KRA Connect client.
//!
//! This crate provides the error taxonomy shared by every KRA Connect crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - Each concrete error struct records where it was created
//! - `KraErrorKind` unifies them so `?` works across crate boundaries
//! - `RetryableError` tells the retry layer which failures are transient
//!
//! # Examples
//!
//! ```
//! use kra_connect_error::{KraResult, ValidationError};
//!
//! fn check(pin: &str) -> KraResult<()> {
//!     if pin.is_empty() {
//!         Err(ValidationError::new("pin", "must not be empty"))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(check("").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod rate_limit;
mod retryable;
mod timeout;
mod transport;
mod upstream;
mod validation;

pub use auth::AuthenticationError;
pub use config::ConfigError;
pub use error::{KraError, KraErrorKind, KraResult};
pub use rate_limit::{RateLimitError, RateLimitErrorKind};
pub use retryable::RetryableError;
pub use timeout::TimeoutError;
pub use transport::TransportError;
pub use upstream::UpstreamError;
pub use validation::ValidationError;
