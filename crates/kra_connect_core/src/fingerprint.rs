//! Deterministic cache keys.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::OperationKind;

/// Cache key derived from an operation and its normalized identifiers.
///
/// The key is `"<operation>:<sha256 hex>"`, so every entry of one operation
/// shares a prefix and can be invalidated as a family.
///
/// # Examples
///
/// ```
/// use kra_connect_core::{OperationKind, RequestFingerprint};
///
/// let a = RequestFingerprint::new(OperationKind::PinVerification, &["p051234567a "]);
/// let b = RequestFingerprint::new(OperationKind::PinVerification, &["P051234567A"]);
/// assert_eq!(a, b);
/// assert!(a.as_str().starts_with("pin_verification:"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    /// Fingerprint `operation` applied to `parts`.
    ///
    /// Parts are trimmed and uppercased before hashing and are separated by a
    /// unit separator so `["AB", "C"]` and `["A", "BC"]` differ.
    pub fn new<S: AsRef<str>>(operation: OperationKind, parts: &[S]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(operation.as_ref().as_bytes());
        for part in parts {
            hasher.update([0x1f]);
            hasher.update(part.as_ref().trim().to_uppercase().as_bytes());
        }
        Self(format!("{}:{:x}", operation, hasher.finalize()))
    }

    /// Key prefix shared by every fingerprint of `operation`.
    pub fn prefix_for(operation: OperationKind) -> String {
        format!("{}:", operation)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RequestFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<RequestFingerprint> for String {
    fn from(value: RequestFingerprint) -> Self {
        value.0
    }
}
