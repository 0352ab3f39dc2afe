//! Deadline errors.

use std::time::Duration;

/// An attempt (or a whole invocation) exceeded its deadline.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Timeout Error: {} did not answer within {:?} (attempt {}) at line {} in {}",
    endpoint,
    timeout,
    attempt,
    line,
    file
)]
pub struct TimeoutError {
    /// Endpoint that was being called
    pub endpoint: String,
    /// The deadline that expired
    pub timeout: Duration,
    /// 1-based attempt number that timed out
    pub attempt: u32,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl TimeoutError {
    /// Create a new TimeoutError at the current location.
    #[track_caller]
    pub fn new(endpoint: impl Into<String>, timeout: Duration, attempt: u32) -> Self {
        let location = std::panic::Location::caller();
        Self {
            endpoint: endpoint.into(),
            timeout,
            attempt,
            line: location.line(),
            file: location.file(),
        }
    }
}
