//! Throttling errors.

use std::time::Duration;

/// Where the throttling came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The local token bucket is empty
    #[display("local token bucket empty, retry in {:?}", wait)]
    Local {
        /// Time until one token is available
        wait: Duration,
    },
    /// The endpoint answered HTTP 429
    #[display("upstream throttled the request, retry in {:?}", retry_after)]
    Upstream {
        /// Hint from `Retry-After`, or the default window
        retry_after: Duration,
    },
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a local bucket rejection.
    #[track_caller]
    pub fn local(wait: Duration) -> Self {
        Self::new(RateLimitErrorKind::Local { wait })
    }

    /// Shorthand for an upstream 429.
    #[track_caller]
    pub fn upstream(retry_after: Duration) -> Self {
        Self::new(RateLimitErrorKind::Upstream { retry_after })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }

    /// How long the caller should wait before trying again.
    pub fn wait(&self) -> Duration {
        match self.kind {
            RateLimitErrorKind::Local { wait } => wait,
            RateLimitErrorKind::Upstream { retry_after } => retry_after,
        }
    }

    /// True when the endpoint, not the local bucket, refused the call.
    pub fn is_upstream(&self) -> bool {
        matches!(self.kind, RateLimitErrorKind::Upstream { .. })
    }
}
