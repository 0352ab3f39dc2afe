//! Core data types for the KRA Connect verification client.
//!
//! This crate provides the data model shared by every layer of the request
//! pipeline: operation kinds, request fingerprints, wire envelopes, typed
//! result records, and the identifier validator that runs before any cache or
//! network activity.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod envelope;
mod fingerprint;
mod operation;
mod records;
mod request;
mod telemetry;
pub mod validation;
mod verification;

pub use envelope::{ErrorEnvelope, SuccessEnvelope};
pub use fingerprint::RequestFingerprint;
pub use operation::OperationKind;
pub use records::{
    EslipValidation, NilReturnReceipt, PinVerification, TaxpayerDetails, TccVerification,
};
pub use request::{NilReturnRequest, NormalizedRequest, RawInput};
pub use telemetry::init_tracing;
pub use validation::{IdentifierKind, Validator};
pub use verification::VerificationResult;
