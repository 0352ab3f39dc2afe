//! The binding-layer client.

use crate::{KraConnectConfig, RequestPipeline};
use futures::future::join_all;
use kra_connect_cache::CacheStats;
use kra_connect_core::{
    EslipValidation, NilReturnReceipt, NilReturnRequest, OperationKind, PinVerification,
    RawInput, TaxpayerDetails, TccVerification, VerificationResult,
};
use kra_connect_error::{ConfigError, KraError, KraResult, TransportError};
use kra_connect_http::HttpTransport;
use kra_connect_interface::VerificationTransport;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

/// Environment variable holding the bearer token.
pub const API_KEY_ENV: &str = "KRA_API_KEY";

/// Client for the KRA verification API.
///
/// Every client owns its own cache and token bucket; clones share them.
///
/// # Example
///
/// ```no_run
/// use kra_connect::KraClient;
///
/// # async fn run() -> Result<(), kra_connect::KraError> {
/// let client = KraClient::builder().bearer_token("token").build()?;
/// let result = client.verify_pin("P051234567A").await?;
/// if result.data().is_active() {
///     println!("{} is active", result.data().pin());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KraClient {
    pipeline: Arc<RequestPipeline>,
    config: Arc<KraConnectConfig>,
}

impl KraClient {
    /// Start building a client.
    pub fn builder() -> KraClientBuilder {
        KraClientBuilder::default()
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &KraConnectConfig {
        &self.config
    }

    /// The underlying pipeline.
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Verify that a PIN is registered.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a malformed PIN, or the failure that
    /// ended the call.
    pub async fn verify_pin(&self, pin: &str) -> KraResult<VerificationResult<PinVerification>> {
        self.execute(OperationKind::PinVerification, &RawInput::from(pin))
            .await
    }

    /// Verify a PIN, giving up after `deadline`.
    ///
    /// # Errors
    ///
    /// As [`verify_pin`](Self::verify_pin), plus a `TimeoutError` when the
    /// deadline passes.
    pub async fn verify_pin_with_deadline(
        &self,
        pin: &str,
        deadline: Duration,
    ) -> KraResult<VerificationResult<PinVerification>> {
        self.execute_with_deadline(OperationKind::PinVerification, &RawInput::from(pin), deadline)
            .await
    }

    /// Verify a tax compliance certificate.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a malformed number, or the failure that
    /// ended the call.
    pub async fn verify_tcc(
        &self,
        tcc_number: &str,
    ) -> KraResult<VerificationResult<TccVerification>> {
        self.execute(OperationKind::TccVerification, &RawInput::from(tcc_number))
            .await
    }

    /// Validate an e-slip number.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a malformed number, or the failure that
    /// ended the call.
    pub async fn validate_eslip(
        &self,
        eslip_number: &str,
    ) -> KraResult<VerificationResult<EslipValidation>> {
        self.execute(OperationKind::EslipValidation, &RawInput::from(eslip_number))
            .await
    }

    /// File a nil return. Never served from cache.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the bad field, or the failure that
    /// ended the call.
    pub async fn file_nil_return(
        &self,
        request: NilReturnRequest,
    ) -> KraResult<VerificationResult<NilReturnReceipt>> {
        self.execute(OperationKind::NilReturnFiling, &RawInput::from(request))
            .await
    }

    /// Fetch the registered details of a taxpayer.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for a malformed PIN, or the failure that
    /// ended the call.
    pub async fn get_taxpayer_details(
        &self,
        pin: &str,
    ) -> KraResult<VerificationResult<TaxpayerDetails>> {
        self.execute(OperationKind::TaxpayerDetails, &RawInput::from(pin))
            .await
    }

    /// Verify many PINs concurrently.
    ///
    /// Output `i` is the outcome for input `i`. At most
    /// `batch.max_concurrent` calls are in flight at once.
    pub async fn verify_pins_batch<S: AsRef<str>>(
        &self,
        pins: &[S],
    ) -> Vec<KraResult<VerificationResult<PinVerification>>> {
        self.batch(OperationKind::PinVerification, pins).await
    }

    /// Verify many certificates concurrently. Ordering as
    /// [`verify_pins_batch`](Self::verify_pins_batch).
    pub async fn verify_tccs_batch<S: AsRef<str>>(
        &self,
        tcc_numbers: &[S],
    ) -> Vec<KraResult<VerificationResult<TccVerification>>> {
        self.batch(OperationKind::TccVerification, tcc_numbers).await
    }

    /// Run any operation with a typed payload.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::execute`].
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: OperationKind,
        input: &RawInput,
    ) -> KraResult<VerificationResult<T>> {
        self.pipeline.execute(operation, input).await
    }

    /// Run any operation under an overall deadline.
    ///
    /// # Errors
    ///
    /// See [`RequestPipeline::execute_with_deadline`].
    pub async fn execute_with_deadline<T: DeserializeOwned>(
        &self,
        operation: OperationKind,
        input: &RawInput,
        deadline: Duration,
    ) -> KraResult<VerificationResult<T>> {
        self.pipeline
            .execute_with_deadline(operation, input, deadline)
            .await
    }

    #[instrument(skip(self, identifiers), fields(operation = %operation, count = identifiers.len()))]
    async fn batch<T, S>(
        &self,
        operation: OperationKind,
        identifiers: &[S],
    ) -> Vec<KraResult<VerificationResult<T>>>
    where
        T: DeserializeOwned,
        S: AsRef<str>,
    {
        let permits = Semaphore::new(*self.config.batch().max_concurrent());
        let permits = &permits;
        let calls = identifiers.iter().map(|identifier| {
            let input = RawInput::from(identifier.as_ref());
            async move {
                let _permit = permits.acquire().await.map_err(|e| {
                    KraError::from(TransportError::new(format!("Batch aborted: {e}")))
                })?;
                self.pipeline.execute(operation, &input).await
            }
        });
        let results = join_all(calls).await;
        debug!(
            succeeded = results.iter().filter(|r| r.is_ok()).count(),
            "Batch finished"
        );
        results
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.pipeline.clear_cache();
    }

    /// Drop cached responses of one operation. Returns how many were removed.
    pub fn invalidate_operation(&self, operation: OperationKind) -> usize {
        self.pipeline.invalidate_operation(operation)
    }

    /// Remove expired responses. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.pipeline.cleanup_expired()
    }

    /// Cache occupancy.
    pub fn cache_stats(&self) -> CacheStats {
        self.pipeline.cache_stats()
    }
}

/// Builder for [`KraClient`].
///
/// Without an explicit transport the client talks HTTP using the `[http]`
/// section of its configuration and the bearer token.
#[derive(Default)]
pub struct KraClientBuilder {
    config: Option<KraConnectConfig>,
    transport: Option<Arc<dyn VerificationTransport>>,
    bearer_token: Option<String>,
}

impl KraClientBuilder {
    /// Use `config` instead of the built-in defaults.
    pub fn config(mut self, config: KraConnectConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Send requests through `transport`.
    pub fn transport(mut self, transport: impl VerificationTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Send requests through a shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn VerificationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Authenticate with `token`.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Read the bearer token from `KRA_API_KEY`, loading `.env` first if
    /// present.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the variable is unset.
    pub fn bearer_token_from_env(self) -> KraResult<Self> {
        dotenvy::dotenv().ok();
        let token = std::env::var(API_KEY_ENV).map_err(|_| {
            KraError::from(ConfigError::new(format!("{API_KEY_ENV} is not set")))
        })?;
        Ok(self.bearer_token(token))
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the configuration is invalid, or if no
    /// transport was given and no bearer token is available for HTTP.
    pub fn build(self) -> KraResult<KraClient> {
        let config = self.config.unwrap_or_default();
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let token = self.bearer_token.ok_or_else(|| {
                    KraError::from(ConfigError::new(
                        "a bearer token is required for the HTTP transport",
                    ))
                })?;
                Arc::new(HttpTransport::new(config.http().clone(), token)?)
                    as Arc<dyn VerificationTransport>
            }
        };
        let pipeline = RequestPipeline::new(&config, transport)?;
        Ok(KraClient {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        })
    }
}
