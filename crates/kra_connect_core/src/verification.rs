//! Immutable results handed to the binding layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{OperationKind, RequestFingerprint};

/// Typed outcome of one successful pipeline invocation.
///
/// Constructed once by the pipeline and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct VerificationResult<T> {
    /// Operation that produced the result
    operation: OperationKind,
    /// Cache key of the request
    fingerprint: RequestFingerprint,
    /// Upstream response code
    response_code: String,
    /// Upstream response description
    response_desc: String,
    /// Typed payload
    data: T,
    /// Whether the result was served from the in-process cache
    from_cache: bool,
    /// When the upstream produced the response
    fetched_at: DateTime<Utc>,
}

impl<T> VerificationResult<T> {
    /// Create a result.
    pub fn new(
        operation: OperationKind,
        fingerprint: RequestFingerprint,
        response_code: impl Into<String>,
        response_desc: impl Into<String>,
        data: T,
        from_cache: bool,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            operation,
            fingerprint,
            response_code: response_code.into(),
            response_desc: response_desc.into(),
            data,
            from_cache,
            fetched_at,
        }
    }

    /// Take the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}
