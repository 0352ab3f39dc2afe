//! Settings for the HTTP transport.

use derive_getters::Getters;
use kra_connect_error::{ConfigError, KraResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.kra.go.ke/v1";

/// `[http]` section of the client configuration.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters, derive_builder::Builder,
)]
#[setters(prefix = "with_", into)]
#[builder(setter(into))]
pub struct HttpConfig {
    /// API root; endpoint paths are appended to it
    #[serde(default = "default_base_url")]
    #[builder(default = "default_base_url()")]
    base_url: String,

    /// Socket-level timeout for one request (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    #[builder(default = "default_request_timeout_ms()")]
    request_timeout_ms: u64,

    /// Value of the `User-Agent` header
    #[serde(default = "default_user_agent")]
    #[builder(default = "default_user_agent()")]
    user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    format!("kra-connect-rust/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Socket-level timeout for one request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Full URL for an endpoint path.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Reject an unusable base URL or timeout.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the base URL is blank or not http(s), or the
    /// timeout is zero.
    pub fn validate(&self) -> KraResult<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            Err(ConfigError::new("http.base_url must not be empty"))?
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            Err(ConfigError::new(format!(
                "http.base_url must start with http:// or https://, got {base}"
            )))?
        }
        if self.request_timeout_ms == 0 {
            Err(ConfigError::new("http.request_timeout_ms must be positive"))?
        }
        Ok(())
    }
}
