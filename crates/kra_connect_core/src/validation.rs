//! Structural validation of identifiers.
//!
//! Validation is pure: the same raw input always normalizes to the same value
//! or fails with the same error. It runs before cache lookup and rate limiting
//! so that malformed input never reaches either.

use std::sync::LazyLock;

use chrono::NaiveDate;
use kra_connect_error::ValidationError;
use regex::Regex;

use crate::{NormalizedRequest, OperationKind, RawInput};

static PIN: LazyLock<Regex> = LazyLock::new(|| regex(r"^[A-Z][0-9]{9}[A-Z]$"));
static TCC: LazyLock<Regex> = LazyLock::new(|| regex(r"^TCC[0-9]{6,10}$"));
static ESLIP: LazyLock<Regex> = LazyLock::new(|| regex(r"^[A-Z0-9]{10,20}$"));
static PERIOD: LazyLock<Regex> = LazyLock::new(|| regex(r"^([0-9]{4})-([0-9]{2})$"));
static DATE: LazyLock<Regex> = LazyLock::new(|| regex(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$"));
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^[a-z0-9._%+-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}$"));
static PHONE: LazyLock<Regex> = LazyLock::new(|| regex(r"^(?:\+?254|0)([17][0-9]{8})$"));
static OBLIGATION: LazyLock<Regex> = LazyLock::new(|| regex(r"^[A-Z0-9]{1,20}$"));

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static identifier pattern compiles")
}

/// Lowest and highest filing year accepted in a tax period.
pub const PERIOD_YEAR_RANGE: std::ops::RangeInclusive<u32> = 2000..=2100;

/// Every identifier shape the validator knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum IdentifierKind {
    /// One letter, nine digits, one letter (e.g. `P051234567A`)
    Pin,
    /// `TCC` followed by 6–10 digits
    TccNumber,
    /// 10–20 letters or digits
    EslipNumber,
    /// `YYYY-MM`
    TaxPeriod,
    /// `YYYY-MM-DD`
    Date,
    /// An email address
    Email,
    /// A Kenyan mobile number: `07`/`01` + 8 digits, or the same after `+254`/`254`
    PhoneNumber,
    /// 1–20 letters or digits
    ObligationId,
}

impl IdentifierKind {
    /// Field name reported in validation errors.
    pub fn field(&self) -> &'static str {
        match self {
            IdentifierKind::Pin => "pin",
            IdentifierKind::TccNumber => "tcc_number",
            IdentifierKind::EslipNumber => "eslip_number",
            IdentifierKind::TaxPeriod => "period",
            IdentifierKind::Date => "date",
            IdentifierKind::Email => "email",
            IdentifierKind::PhoneNumber => "phone_number",
            IdentifierKind::ObligationId => "obligation_id",
        }
    }
}

/// Validator for identifiers and whole requests.
///
/// # Examples
///
/// ```
/// use kra_connect_core::{IdentifierKind, Validator};
///
/// let pin = Validator::validate(IdentifierKind::Pin, " p051234567a ").unwrap();
/// assert_eq!(pin, "P051234567A");
///
/// let err = Validator::validate(IdentifierKind::Pin, "12345").unwrap_err();
/// assert_eq!(err.field, "pin");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    /// Validate `raw` as `kind` and return its canonical form.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the field and the broken rule.
    pub fn validate(kind: IdentifierKind, raw: &str) -> Result<String, ValidationError> {
        let field = kind.field();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(field, "must not be empty"));
        }

        match kind {
            IdentifierKind::Pin => {
                matching(&PIN, trimmed.to_uppercase(), field, "expected one letter, nine digits and one letter")
            }
            IdentifierKind::TccNumber => {
                matching(&TCC, trimmed.to_uppercase(), field, "expected TCC followed by 6 to 10 digits")
            }
            IdentifierKind::EslipNumber => {
                matching(&ESLIP, trimmed.to_uppercase(), field, "expected 10 to 20 letters or digits")
            }
            IdentifierKind::ObligationId => {
                matching(&OBLIGATION, trimmed.to_uppercase(), field, "expected 1 to 20 letters or digits")
            }
            IdentifierKind::TaxPeriod => validate_period(trimmed),
            IdentifierKind::Date => validate_date(trimmed),
            IdentifierKind::Email => {
                matching(&EMAIL, trimmed.to_lowercase(), field, "not a valid email address")
            }
            IdentifierKind::PhoneNumber => validate_phone(trimmed),
        }
    }

    /// Validate the input for `operation` and build the normalized request.
    ///
    /// # Errors
    ///
    /// Fails when an identifier is malformed or when the input shape does not
    /// fit the operation (a filing record for a lookup, or the reverse).
    pub fn normalize(
        operation: OperationKind,
        raw: &RawInput,
    ) -> Result<NormalizedRequest, ValidationError> {
        let identifiers = match (operation, raw) {
            (OperationKind::NilReturnFiling, RawInput::NilReturn(record)) => vec![
                Self::validate(IdentifierKind::Pin, &record.pin)?,
                Self::validate(IdentifierKind::TaxPeriod, &record.period)?,
                Self::validate(IdentifierKind::ObligationId, &record.obligation_id)?,
            ],
            (OperationKind::NilReturnFiling, RawInput::Identifier(_)) => {
                return Err(ValidationError::new(
                    "request",
                    "nil return filing needs a pin, period and obligation id",
                ));
            }
            (_, RawInput::NilReturn(_)) => {
                return Err(ValidationError::new(
                    "request",
                    format!("{} takes a single identifier", operation),
                ));
            }
            (OperationKind::TccVerification, RawInput::Identifier(id)) => {
                vec![Self::validate(IdentifierKind::TccNumber, id)?]
            }
            (OperationKind::EslipValidation, RawInput::Identifier(id)) => {
                vec![Self::validate(IdentifierKind::EslipNumber, id)?]
            }
            (
                OperationKind::PinVerification | OperationKind::TaxpayerDetails,
                RawInput::Identifier(id),
            ) => vec![Self::validate(IdentifierKind::Pin, id)?],
        };
        Ok(NormalizedRequest::from_identifiers(operation, identifiers))
    }
}

fn matching(
    pattern: &Regex,
    candidate: String,
    field: &'static str,
    reason: &'static str,
) -> Result<String, ValidationError> {
    if pattern.is_match(&candidate) {
        Ok(candidate)
    } else {
        Err(ValidationError::new(field, reason))
    }
}

fn validate_period(raw: &str) -> Result<String, ValidationError> {
    let field = IdentifierKind::TaxPeriod.field();
    let captures = PERIOD
        .captures(raw)
        .ok_or_else(|| ValidationError::new(field, "expected YYYY-MM"))?;
    let year: u32 = captures[1]
        .parse()
        .map_err(|_| ValidationError::new(field, "year is not a number"))?;
    let month: u32 = captures[2]
        .parse()
        .map_err(|_| ValidationError::new(field, "month is not a number"))?;

    if !PERIOD_YEAR_RANGE.contains(&year) {
        return Err(ValidationError::new(
            field,
            format!(
                "year must be between {} and {}",
                PERIOD_YEAR_RANGE.start(),
                PERIOD_YEAR_RANGE.end()
            ),
        ));
    }
    if !(1..=12).contains(&month) {
        return Err(ValidationError::new(field, "month must be between 01 and 12"));
    }
    Ok(format!("{year:04}-{month:02}"))
}

fn validate_date(raw: &str) -> Result<String, ValidationError> {
    let field = IdentifierKind::Date.field();
    if !DATE.is_match(raw) {
        return Err(ValidationError::new(field, "expected YYYY-MM-DD"));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| ValidationError::new(field, "not a calendar date"))
}

fn validate_phone(raw: &str) -> Result<String, ValidationError> {
    let field = IdentifierKind::PhoneNumber.field();
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    PHONE
        .captures(&compact)
        .map(|captures| format!("+254{}", &captures[1]))
        .ok_or_else(|| ValidationError::new(field, "expected a Kenyan number such as 0712345678"))
}
