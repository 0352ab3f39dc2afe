//! Wire-level request and response types.

use derive_getters::Getters;
use kra_connect_core::{NormalizedRequest, OperationKind};
use kra_connect_error::{KraResult, UpstreamError};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// One outbound call, already validated.
#[derive(Debug, Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct TransportRequest {
    /// Operation being performed
    operation: OperationKind,
    /// Path relative to the API base URL
    endpoint: String,
    /// JSON request body
    body: JsonValue,
    /// 1-based attempt number within the retry loop
    #[builder(default = "1")]
    attempt: u32,
}

impl TransportRequest {
    /// Build the first attempt for a normalized request.
    pub fn from_normalized(request: &NormalizedRequest) -> Self {
        Self {
            operation: *request.operation(),
            endpoint: request.operation().endpoint().to_string(),
            body: request.body().clone(),
            attempt: 1,
        }
    }

    /// The same request, tagged with a different attempt number.
    pub fn for_attempt(&self, attempt: u32) -> Self {
        Self {
            attempt,
            ..self.clone()
        }
    }
}

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct TransportResponse {
    /// HTTP status code
    status: u16,
    /// Response body as text
    #[builder(default)]
    body: String,
    /// Parsed `Retry-After` hint, if the upstream sent one
    #[builder(default)]
    retry_after: Option<Duration>,
    /// Upstream correlation id, if the upstream sent one
    #[builder(default)]
    request_id: Option<String>,
}

impl TransportResponse {
    /// Response with a status and body and no headers of interest.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
            request_id: None,
        }
    }

    /// Attach a `Retry-After` hint.
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Attach an upstream request id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns an `UpstreamError` carrying this response's status if the body
    /// is not valid JSON of the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> KraResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            UpstreamError::new(self.status, format!("Malformed response body: {e}")).into()
        })
    }
}
