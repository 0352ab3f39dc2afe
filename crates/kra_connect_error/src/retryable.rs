//! Retry classification.

use std::time::Duration;

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use kra_connect_error::{KraError, RetryableError, TransportError, ValidationError};
///
/// let transient: KraError = TransportError::new("connection reset").into();
/// assert!(transient.is_retryable());
///
/// let permanent: KraError = ValidationError::new("pin", "too short").into();
/// assert!(!permanent.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Network failures, timeouts, upstream throttling and 5xx responses are
    /// transient. Authentication and validation failures are permanent.
    fn is_retryable(&self) -> bool;

    /// Delay requested by the upstream before the next attempt, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// HTTP status associated with this error, if it came from a response.
    fn status_code(&self) -> Option<u16> {
        None
    }
}
