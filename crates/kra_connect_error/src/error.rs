//! Top-level error wrapper types.

use std::time::Duration;

use crate::{
    AuthenticationError, ConfigError, RateLimitError, RetryableError, TimeoutError,
    TransportError, UpstreamError, ValidationError,
};

/// Every failure a KRA Connect operation can surface.
///
/// # Examples
///
/// ```
/// use kra_connect_error::{KraError, TransportError};
///
/// let err: KraError = TransportError::new("Connection failed").into();
/// assert!(format!("{}", err).contains("Transport Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum KraErrorKind {
    /// Malformed caller input
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Credential rejected by the endpoint
    #[from(AuthenticationError)]
    Authentication(AuthenticationError),
    /// Local or upstream throttling
    #[from(RateLimitError)]
    RateLimit(RateLimitError),
    /// Deadline exceeded
    #[from(TimeoutError)]
    Timeout(TimeoutError),
    /// Connectivity failure
    #[from(TransportError)]
    Transport(TransportError),
    /// Structured error envelope from the endpoint
    #[from(UpstreamError)]
    Upstream(UpstreamError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// KRA Connect error with kind discrimination.
///
/// # Examples
///
/// ```
/// use kra_connect_error::{KraErrorKind, KraResult, ValidationError};
///
/// fn might_fail() -> KraResult<()> {
///     Err(ValidationError::new("pin", "missing"))?
/// }
///
/// let err = might_fail().unwrap_err();
/// assert!(matches!(err.kind(), KraErrorKind::Validation(_)));
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("KRA Connect Error: {}", _0)]
pub struct KraError(Box<KraErrorKind>);

impl KraError {
    /// Create a new error from a kind.
    pub fn new(kind: KraErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &KraErrorKind {
        &self.0
    }

    /// Consume the wrapper and return the kind.
    pub fn into_kind(self) -> KraErrorKind {
        *self.0
    }
}

// Generic From implementation for any type that converts to KraErrorKind
impl<T> From<T> for KraError
where
    T: Into<KraErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

impl RetryableError for KraError {
    fn is_retryable(&self) -> bool {
        match self.kind() {
            KraErrorKind::Validation(_)
            | KraErrorKind::Authentication(_)
            | KraErrorKind::Config(_) => false,
            KraErrorKind::RateLimit(e) => e.is_upstream(),
            KraErrorKind::Timeout(_) | KraErrorKind::Transport(_) => true,
            KraErrorKind::Upstream(e) => e.is_server_error(),
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self.kind() {
            KraErrorKind::RateLimit(e) if e.is_upstream() => Some(e.wait()),
            _ => None,
        }
    }

    fn status_code(&self) -> Option<u16> {
        match self.kind() {
            KraErrorKind::Authentication(e) => Some(e.status_code),
            KraErrorKind::Upstream(e) => Some(e.status_code),
            KraErrorKind::RateLimit(e) if e.is_upstream() => Some(429),
            _ => None,
        }
    }
}

/// Result type for KRA Connect operations.
pub type KraResult<T> = std::result::Result<T, KraError>;
