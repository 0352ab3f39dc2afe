//! Wire envelopes exchanged with the verification API.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Body of a 2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope {
    /// Upstream response code (e.g. `"200"`)
    #[serde(default)]
    pub response_code: String,
    /// Human readable description of the response code
    #[serde(default)]
    pub response_desc: String,
    /// Upstream status string (e.g. `"OK"`)
    #[serde(default)]
    pub status: String,
    /// Operation-specific payload
    #[serde(default)]
    pub response_data: JsonValue,
}

/// Body of a non-2xx response, when the endpoint sends one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Machine-readable error code
    #[serde(default)]
    pub error_code: Option<String>,
    /// Human readable message
    #[serde(default)]
    pub error_message: Option<String>,
    /// Correlation id for support requests
    #[serde(default)]
    pub request_id: Option<String>,
}
