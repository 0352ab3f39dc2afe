//! Caller input before and after validation.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::{OperationKind, RequestFingerprint};

/// Record submitted when filing a nil return.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NilReturnRequest {
    /// PIN of the taxpayer
    pub pin: String,
    /// Filing period, `YYYY-MM`
    pub period: String,
    /// Obligation being filed (e.g. `"1"` for income tax)
    pub obligation_id: String,
}

impl NilReturnRequest {
    /// Create a new filing record.
    pub fn new(
        pin: impl Into<String>,
        period: impl Into<String>,
        obligation_id: impl Into<String>,
    ) -> Self {
        Self {
            pin: pin.into(),
            period: period.into(),
            obligation_id: obligation_id.into(),
        }
    }
}

/// Unvalidated input for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From)]
pub enum RawInput {
    /// A single identifier (PIN, TCC number, slip number)
    Identifier(String),
    /// A filing record
    NilReturn(NilReturnRequest),
}

impl From<&str> for RawInput {
    fn from(value: &str) -> Self {
        RawInput::Identifier(value.to_string())
    }
}

/// Validated input: canonical identifiers, the request body and the cache key.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct NormalizedRequest {
    operation: OperationKind,
    identifiers: Vec<String>,
    body: JsonValue,
    fingerprint: RequestFingerprint,
}

impl NormalizedRequest {
    /// Assemble a request from already-normalized identifiers.
    ///
    /// The body layout is fixed per operation; callers go through
    /// [`crate::Validator::normalize`] rather than calling this directly.
    pub(crate) fn from_identifiers(operation: OperationKind, identifiers: Vec<String>) -> Self {
        let body = match (operation, identifiers.as_slice()) {
            (OperationKind::NilReturnFiling, [pin, period, obligation]) => json!({
                "pin": pin,
                "period": period,
                "obligationId": obligation,
            }),
            (OperationKind::TccVerification, [tcc]) => json!({ "tccNumber": tcc }),
            (OperationKind::EslipValidation, [slip]) => json!({ "eslipNumber": slip }),
            (_, [pin, ..]) => json!({ "pin": pin }),
            (_, []) => JsonValue::Null,
        };
        let fingerprint = RequestFingerprint::new(operation, &identifiers);
        Self {
            operation,
            identifiers,
            body,
            fingerprint,
        }
    }
}
