//! reqwest-backed transport.

use crate::HttpConfig;
use async_trait::async_trait;
use kra_connect_error::{ConfigError, KraError, KraResult, TimeoutError, TransportError};
use kra_connect_interface::{TransportRequest, TransportResponse, VerificationTransport};
use kra_connect_rate_limit::parse_retry_after;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap};
use tracing::{debug, error, instrument};

/// Header carrying the upstream correlation id.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Sends verification calls over HTTPS with a bearer token.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
    bearer_token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("config", &self.config)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

impl HttpTransport {
    /// Creates a transport for `config`, authenticating with `bearer_token`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: HttpConfig, bearer_token: impl Into<String>) -> KraResult<Self> {
        config.validate()?;
        let bearer_token = bearer_token.into();
        if bearer_token.trim().is_empty() {
            Err(ConfigError::new("bearer token must not be empty"))?
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent().as_str())
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {e}")))?;

        debug!(base_url = %config.base_url(), "Creating HTTP transport");
        Ok(Self {
            client,
            config,
            bearer_token,
        })
    }

    /// The configuration this transport was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn request_id(headers: &HeaderMap) -> Option<String> {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

#[async_trait]
impl VerificationTransport for HttpTransport {
    #[instrument(
        skip(self, request),
        fields(
            operation = %request.operation(),
            endpoint = %request.endpoint(),
            attempt = *request.attempt()
        )
    )]
    async fn send(&self, request: &TransportRequest) -> KraResult<TransportResponse> {
        let url = self.config.url_for(request.endpoint());
        debug!(url = %url, "Sending request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .header(ACCEPT, "application/json")
            .json(request.body())
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Request failed before a response arrived");
                if e.is_timeout() {
                    KraError::from(TimeoutError::new(
                        request.endpoint().as_str(),
                        self.config.request_timeout(),
                        *request.attempt(),
                    ))
                } else {
                    KraError::from(TransportError::new(format!("Request to {url} failed: {e}")))
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers());
        let request_id = Self::request_id(response.headers());
        let body = response.text().await.map_err(|e| {
            error!(error = ?e, status, "Failed to read response body");
            TransportError::new(format!("Failed to read response body: {e}"))
        })?;

        debug!(status, body_len = body.len(), ?retry_after, "Received response");

        let mut transport_response = TransportResponse::new(status, body);
        if let Some(retry_after) = retry_after {
            transport_response = transport_response.with_retry_after(retry_after);
        }
        if let Some(request_id) = request_id {
            transport_response = transport_response.with_request_id(request_id);
        }
        Ok(transport_response)
    }

    fn name(&self) -> &str {
        "http"
    }
}
