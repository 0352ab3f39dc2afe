//! Input validation errors.

/// Malformed caller input, rejected before any cache or network activity.
///
/// # Examples
///
/// ```
/// use kra_connect_error::ValidationError;
///
/// let err = ValidationError::new("pin", "expected one letter, nine digits, one letter");
/// assert_eq!(err.field, "pin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {}: {} at line {} in {}", field, reason, line, file)]
pub struct ValidationError {
    /// Name of the offending field (e.g. `pin`, `tcc_number`)
    pub field: String,
    /// Why the value was rejected
    pub reason: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError for `field` at the current location.
    #[track_caller]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            field: field.into(),
            reason: reason.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
