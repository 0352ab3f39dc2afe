//! Credential rejection errors.

/// The upstream rejected the bearer credential (HTTP 401/403).
///
/// Never retried: repeating the call with the same credential cannot succeed.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Authentication Error: HTTP {}: {} at line {} in {}", status_code, message, line, file)]
pub struct AuthenticationError {
    /// HTTP status returned by the endpoint
    pub status_code: u16,
    /// Message from the error envelope, or a generic description
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl AuthenticationError {
    /// Create a new AuthenticationError at the current location.
    #[track_caller]
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            status_code,
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
