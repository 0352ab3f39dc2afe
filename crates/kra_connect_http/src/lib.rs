//! HTTP transport for the KRA Connect client.
//!
//! [`HttpTransport`] implements [`kra_connect_interface::VerificationTransport`]
//! over `reqwest`: one JSON `POST` per attempt, authenticated with a bearer
//! token, with any `Retry-After` hint lifted off the response headers.

mod config;
mod transport;

pub use config::{HttpConfig, HttpConfigBuilder, DEFAULT_BASE_URL};
pub use transport::HttpTransport;
