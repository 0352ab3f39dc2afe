//! Structured errors returned by the remote endpoint.

/// A non-success response carrying the upstream error envelope.
///
/// # Examples
///
/// ```
/// use kra_connect_error::UpstreamError;
///
/// let err = UpstreamError::new(503, "Service unavailable")
///     .with_error_code("SVC_DOWN")
///     .with_request_id("req-42");
/// assert!(err.is_server_error());
/// assert_eq!(err.request_id.as_deref(), Some("req-42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Error: HTTP {}: {} at line {} in {}", status_code, message, line, file)]
pub struct UpstreamError {
    /// HTTP status code of the response
    pub status_code: u16,
    /// `errorCode` from the error envelope, if present
    pub error_code: Option<String>,
    /// `errorMessage` from the error envelope, or the status reason
    pub message: String,
    /// `requestId` from the error envelope, if present
    pub request_id: Option<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl UpstreamError {
    /// Create a new UpstreamError at the current location.
    #[track_caller]
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            status_code,
            error_code: None,
            message: message.into(),
            request_id: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Attach the envelope's error code.
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Attach the envelope's request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// True for 5xx responses.
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }
}
