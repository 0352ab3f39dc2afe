//! Tests for identifier validation.

use kra_connect_core::{
    IdentifierKind, NilReturnRequest, OperationKind, RawInput, RequestFingerprint, Validator,
};

#[test]
fn test_pin_accepted_unchanged() {
    let pin = Validator::validate(IdentifierKind::Pin, "P051234567A").unwrap();
    assert_eq!(pin, "P051234567A");
}

#[test]
fn test_pin_normalized_to_uppercase() {
    let pin = Validator::validate(IdentifierKind::Pin, "p051234567a").unwrap();
    assert_eq!(pin, "P051234567A");

    let padded = Validator::validate(IdentifierKind::Pin, "  a123456789z\n").unwrap();
    assert_eq!(padded, "A123456789Z");
}

#[test]
fn test_short_pin_rejected() {
    let err = Validator::validate(IdentifierKind::Pin, "12345").unwrap_err();
    assert_eq!(err.field, "pin");
}

#[test]
fn test_pin_shape_rules() {
    for bad in ["P05123456A", "P0512345678A", "1051234567A", "P051234567", "P05123X567A"] {
        assert!(
            Validator::validate(IdentifierKind::Pin, bad).is_err(),
            "{bad} should be rejected"
        );
    }
}

#[test]
fn test_validation_is_idempotent() {
    for raw in ["p051234567a", "12345", "", "TCC123456", "2024-13"] {
        for kind in [IdentifierKind::Pin, IdentifierKind::TccNumber, IdentifierKind::TaxPeriod] {
            let first = Validator::validate(kind, raw);
            let second = Validator::validate(kind, raw);
            match (first, second) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => {
                    assert_eq!(a.field, b.field);
                    assert_eq!(a.reason, b.reason);
                }
                _ => panic!("validation of {raw:?} as {kind} was not stable"),
            }
        }
    }
}

#[test]
fn test_tcc_numbers() {
    assert_eq!(
        Validator::validate(IdentifierKind::TccNumber, "tcc123456").unwrap(),
        "TCC123456"
    );
    assert!(Validator::validate(IdentifierKind::TccNumber, "TCC1234567890").is_ok());
    assert!(Validator::validate(IdentifierKind::TccNumber, "TCC12345").is_err());
    assert!(Validator::validate(IdentifierKind::TccNumber, "TCC12345678901").is_err());
    assert!(Validator::validate(IdentifierKind::TccNumber, "ABC123456").is_err());
}

#[test]
fn test_eslip_numbers() {
    assert_eq!(
        Validator::validate(IdentifierKind::EslipNumber, "1234567890").unwrap(),
        "1234567890"
    );
    assert!(Validator::validate(IdentifierKind::EslipNumber, "ab12cd34ef56").is_ok());
    assert!(Validator::validate(IdentifierKind::EslipNumber, "123456789").is_err());
    assert!(Validator::validate(IdentifierKind::EslipNumber, "123456789012345678901").is_err());
    assert!(Validator::validate(IdentifierKind::EslipNumber, "12345-67890").is_err());
}

#[test]
fn test_tax_periods() {
    assert_eq!(
        Validator::validate(IdentifierKind::TaxPeriod, "2024-01").unwrap(),
        "2024-01"
    );
    assert!(Validator::validate(IdentifierKind::TaxPeriod, "2024-12").is_ok());
    assert!(Validator::validate(IdentifierKind::TaxPeriod, "2024-00").is_err());
    assert!(Validator::validate(IdentifierKind::TaxPeriod, "2024-13").is_err());
    assert!(Validator::validate(IdentifierKind::TaxPeriod, "1899-05").is_err());
    assert!(Validator::validate(IdentifierKind::TaxPeriod, "24-05").is_err());
    assert!(Validator::validate(IdentifierKind::TaxPeriod, "2024/05").is_err());
}

#[test]
fn test_dates() {
    assert_eq!(
        Validator::validate(IdentifierKind::Date, "2024-02-29").unwrap(),
        "2024-02-29"
    );
    assert!(Validator::validate(IdentifierKind::Date, "2023-02-29").is_err());
    assert!(Validator::validate(IdentifierKind::Date, "2024-2-1").is_err());
}

#[test]
fn test_contact_fields() {
    assert_eq!(
        Validator::validate(IdentifierKind::Email, " Info@Example.CO.KE ").unwrap(),
        "info@example.co.ke"
    );
    assert!(Validator::validate(IdentifierKind::Email, "not-an-email").is_err());

    for raw in ["0712345678", "+254712345678", "254712345678", "0712 345 678"] {
        assert_eq!(
            Validator::validate(IdentifierKind::PhoneNumber, raw).unwrap(),
            "+254712345678",
            "{raw}"
        );
    }
    assert!(Validator::validate(IdentifierKind::PhoneNumber, "0812345678").is_err());
}

#[test]
fn test_normalize_request_builds_fingerprint() {
    let request =
        Validator::normalize(OperationKind::PinVerification, &RawInput::from(" p051234567a")).unwrap();
    assert_eq!(request.identifiers(), &vec!["P051234567A".to_string()]);
    assert_eq!(request.body()["pin"], "P051234567A");
    assert_eq!(
        request.fingerprint(),
        &RequestFingerprint::new(OperationKind::PinVerification, &["P051234567A"])
    );
}

#[test]
fn test_normalize_nil_return() {
    let raw = RawInput::from(NilReturnRequest::new("p051234567a", "2024-03", "1"));
    let request = Validator::normalize(OperationKind::NilReturnFiling, &raw).unwrap();
    assert_eq!(request.body()["period"], "2024-03");
    assert_eq!(request.body()["obligationId"], "1");

    let bad = RawInput::from(NilReturnRequest::new("P051234567A", "2024-13", "1"));
    let err = Validator::normalize(OperationKind::NilReturnFiling, &bad).unwrap_err();
    assert_eq!(err.field, "period");
}

#[test]
fn test_normalize_rejects_mismatched_input() {
    let err = Validator::normalize(OperationKind::NilReturnFiling, &RawInput::from("P051234567A"))
        .unwrap_err();
    assert_eq!(err.field, "request");

    let record = RawInput::from(NilReturnRequest::new("P051234567A", "2024-03", "1"));
    let err = Validator::normalize(OperationKind::PinVerification, &record).unwrap_err();
    assert_eq!(err.field, "request");
}

#[test]
fn test_non_ascii_digits_rejected() {
    let cases = [
        (IdentifierKind::Pin, "P٠٥١٢٣٤٥٦٧A"),
        (IdentifierKind::TccNumber, "TCC١٢٣٤٥٦"),
        (IdentifierKind::TaxPeriod, "٢٠٢٤-٠١"),
        (IdentifierKind::Date, "٢٠٢٤-٠٢-٢٩"),
        (IdentifierKind::PhoneNumber, "07١٢٣٤٥٦٧٨"),
        (IdentifierKind::EslipNumber, "ES١٢٣٤٥٦٧٨٩"),
    ];
    for (kind, raw) in cases {
        assert!(Validator::validate(kind, raw).is_err(), "{kind}: {raw} should be rejected");
    }
}
