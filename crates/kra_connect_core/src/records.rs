//! Typed payloads handed to the binding layer.
//!
//! Fields are lenient (`#[serde(default)]`) because the upstream omits
//! attributes it has no value for.

use serde::{Deserialize, Serialize};

/// Result of a PIN verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct PinVerification {
    /// The PIN that was checked
    #[serde(default)]
    pin: String,
    /// Whether the PIN is registered and valid
    #[serde(default)]
    is_valid: bool,
    /// Registered name of the taxpayer
    #[serde(default)]
    taxpayer_name: Option<String>,
    /// Registration status (e.g. `"active"`)
    #[serde(default)]
    status: Option<String>,
    /// `"individual"` or `"company"`
    #[serde(default)]
    taxpayer_type: Option<String>,
    /// Date the PIN was issued
    #[serde(default)]
    registration_date: Option<String>,
}

impl PinVerification {
    /// True when the PIN is valid and its status is active.
    pub fn is_active(&self) -> bool {
        self.is_valid
            && self
                .status
                .as_deref()
                .is_none_or(|s| s.eq_ignore_ascii_case("active"))
    }
}

/// Result of a tax compliance certificate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct TccVerification {
    /// The certificate number that was checked
    #[serde(default)]
    tcc_number: String,
    /// Whether the certificate exists and is genuine
    #[serde(default)]
    is_valid: bool,
    /// PIN of the certificate holder
    #[serde(default)]
    taxpayer_pin: Option<String>,
    /// Name of the certificate holder
    #[serde(default)]
    taxpayer_name: Option<String>,
    /// Issue date
    #[serde(default)]
    issue_date: Option<String>,
    /// Expiry date
    #[serde(default)]
    expiry_date: Option<String>,
    /// Certificate status (e.g. `"active"`, `"expired"`)
    #[serde(default)]
    status: Option<String>,
}

/// Result of an e-slip validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct EslipValidation {
    /// The slip number that was checked
    #[serde(default)]
    eslip_number: String,
    /// Whether the slip exists
    #[serde(default)]
    is_valid: bool,
    /// PIN that raised the slip
    #[serde(default)]
    taxpayer_pin: Option<String>,
    /// Amount due on the slip
    #[serde(default)]
    amount: Option<f64>,
    /// ISO currency code
    #[serde(default)]
    currency: Option<String>,
    /// `"paid"`, `"pending"` or `"cancelled"`
    #[serde(default)]
    payment_status: Option<String>,
    /// Date the payment was received
    #[serde(default)]
    payment_date: Option<String>,
}

/// Acknowledgement of a filed nil return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct NilReturnReceipt {
    /// PIN the return was filed for
    #[serde(default)]
    pin: String,
    /// Filing period (`YYYY-MM`)
    #[serde(default)]
    period: String,
    /// Obligation the return covers
    #[serde(default)]
    obligation_id: String,
    /// Whether the filing was accepted
    #[serde(default)]
    success: bool,
    /// Acknowledgement number issued by the tax authority
    #[serde(default)]
    acknowledgement_number: Option<String>,
    /// Timestamp of acceptance
    #[serde(default)]
    filing_date: Option<String>,
}

/// Registered details of a taxpayer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(rename_all = "camelCase")]
pub struct TaxpayerDetails {
    /// The PIN that was looked up
    #[serde(default)]
    pin: String,
    /// Registered name
    #[serde(default)]
    taxpayer_name: Option<String>,
    /// `"individual"` or `"company"`
    #[serde(default)]
    taxpayer_type: Option<String>,
    /// Registration status
    #[serde(default)]
    status: Option<String>,
    /// Date the PIN was issued
    #[serde(default)]
    registration_date: Option<String>,
    /// Registered email address
    #[serde(default)]
    email: Option<String>,
    /// Registered phone number
    #[serde(default)]
    phone_number: Option<String>,
    /// Tax obligations the taxpayer is registered for
    #[serde(default)]
    obligations: Vec<String>,
}
