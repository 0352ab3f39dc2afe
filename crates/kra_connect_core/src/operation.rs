//! The catalogue of remote operations.

use serde::{Deserialize, Serialize};

/// One logical endpoint on the verification API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OperationKind {
    /// Check that a PIN is registered and active
    PinVerification,
    /// Check a tax compliance certificate
    TccVerification,
    /// Validate an e-slip / payment registration number
    EslipValidation,
    /// File a nil return for one obligation and period
    NilReturnFiling,
    /// Fetch the registered details of a taxpayer
    TaxpayerDetails,
}

impl OperationKind {
    /// Path of the endpoint relative to the API base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            OperationKind::PinVerification => "/verify-pin",
            OperationKind::TccVerification => "/verify-tcc",
            OperationKind::EslipValidation => "/validate-eslip",
            OperationKind::NilReturnFiling => "/file-nil-return",
            OperationKind::TaxpayerDetails => "/taxpayer-details",
        }
    }

    /// Whether successful responses may be served from cache.
    ///
    /// Filing is a mutation; replaying a cached receipt would hide a failed
    /// submission.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, OperationKind::NilReturnFiling)
    }
}
