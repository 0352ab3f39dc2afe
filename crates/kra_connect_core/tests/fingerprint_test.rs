//! Tests for request fingerprints and the operation catalogue.

use kra_connect_core::{OperationKind, RequestFingerprint};
use strum::IntoEnumIterator;

#[test]
fn test_fingerprint_is_deterministic() {
    let a = RequestFingerprint::new(OperationKind::TccVerification, &["TCC123456"]);
    let b = RequestFingerprint::new(OperationKind::TccVerification, &["TCC123456"]);
    assert_eq!(a, b);
}

#[test]
fn test_fingerprint_normalizes_case_and_whitespace() {
    let a = RequestFingerprint::new(OperationKind::PinVerification, &["  p051234567a"]);
    let b = RequestFingerprint::new(OperationKind::PinVerification, &["P051234567A"]);
    assert_eq!(a, b);
}

#[test]
fn test_fingerprint_separates_operations() {
    let pin = RequestFingerprint::new(OperationKind::PinVerification, &["P051234567A"]);
    let details = RequestFingerprint::new(OperationKind::TaxpayerDetails, &["P051234567A"]);
    assert_ne!(pin, details);
    assert!(pin.as_str().starts_with(&RequestFingerprint::prefix_for(OperationKind::PinVerification)));
    assert!(details.as_str().starts_with("taxpayer_details:"));
}

#[test]
fn test_fingerprint_part_boundaries_matter() {
    let a = RequestFingerprint::new(OperationKind::NilReturnFiling, &["AB", "C"]);
    let b = RequestFingerprint::new(OperationKind::NilReturnFiling, &["A", "BC"]);
    assert_ne!(a, b);
}

#[test]
fn test_only_filing_is_uncacheable() {
    for operation in OperationKind::iter() {
        assert_eq!(
            operation.is_cacheable(),
            operation != OperationKind::NilReturnFiling
        );
        assert!(operation.endpoint().starts_with('/'));
    }
}
