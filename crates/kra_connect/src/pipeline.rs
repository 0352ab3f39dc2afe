//! The request pipeline.
//!
//! One `execute` call walks
//! `validating → cache_check → (hit → done) | (rate_limit_wait → attempting →
//! retry… → cache_store → done)`. Each stage transition is logged with a
//! `stage` field.
//!
//! The cache and the token bucket are owned by the pipeline. Each is touched
//! only inside short synchronous critical sections; nothing holds a lock
//! across an `.await`.

use crate::KraConnectConfig;
use chrono::{DateTime, Utc};
use kra_connect_cache::{CacheManager, CacheStats};
use kra_connect_core::{
    ErrorEnvelope, NormalizedRequest, OperationKind, RawInput, RequestFingerprint,
    SuccessEnvelope, Validator, VerificationResult,
};
use kra_connect_error::{
    AuthenticationError, KraError, KraResult, RateLimitError, TimeoutError, UpstreamError,
};
use kra_connect_interface::{TransportRequest, TransportResponse, VerificationTransport};
use kra_connect_rate_limit::{
    Classification, RateLimitStrategy, RateLimiter, RetryConfig, RetryHandler,
};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::CacheSettings;

/// States of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    /// Checking the raw input
    Validating,
    /// Looking up the fingerprint
    CacheCheck,
    /// Waiting for a rate-limit token
    RateLimitWait,
    /// Transport call in flight
    Attempting,
    /// Backing off before another attempt
    Retry,
    /// Writing a successful response to the cache
    CacheStore,
    /// Returning to the caller
    Done,
    /// Returning an error to the caller
    Failed,
}

/// A successful response as kept in the cache.
#[derive(Debug, Clone)]
struct CachedResponse {
    envelope: SuccessEnvelope,
    fetched_at: DateTime<Utc>,
}

/// Validation, caching, rate limiting and retry around one transport.
pub struct RequestPipeline {
    transport: Arc<dyn VerificationTransport>,
    cache: Mutex<CacheManager<CachedResponse>>,
    cache_settings: CacheSettings,
    limiter: RateLimiter,
    retry: RetryHandler,
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("transport", &self.transport.name())
            .field("cache_settings", &self.cache_settings)
            .field("limiter", &self.limiter)
            .field("retry", &self.retry)
            .finish()
    }
}

impl RequestPipeline {
    /// Build a pipeline with its own cache and token bucket.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `config` fails validation.
    pub fn new(config: &KraConnectConfig, transport: Arc<dyn VerificationTransport>) -> KraResult<Self> {
        config.validate()?;
        let cache = CacheManager::new(config.cache().cache_config()?);
        debug!(transport = transport.name(), "Creating request pipeline");
        Ok(Self {
            transport,
            cache: Mutex::new(cache),
            cache_settings: config.cache().clone(),
            limiter: RateLimiter::new(config.rate_limit().clone()),
            retry: RetryHandler::new(config.retry().clone()),
        })
    }

    /// The pipeline's rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// The retry configuration in force.
    pub fn retry_config(&self) -> &RetryConfig {
        self.retry.config()
    }

    /// Run one logical call.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` for malformed input (before any cache or
    /// token use), otherwise the last error from the transport once retries
    /// are spent or a permanent failure occurs.
    #[instrument(skip(self, input), fields(operation = %operation))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: OperationKind,
        input: &RawInput,
    ) -> KraResult<VerificationResult<T>> {
        let attempts = AtomicU32::new(0);
        self.run(operation, input, &attempts).await
    }

    /// Run one logical call under an overall deadline.
    ///
    /// The deadline spans every stage, token waits and backoff included. On
    /// expiry the invocation is abandoned wherever it is suspended, nothing is
    /// cached, and consumed tokens are not refunded.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute), plus a `TimeoutError` whose `attempt`
    /// is the number of attempts started when the deadline passed.
    #[instrument(skip(self, input), fields(operation = %operation, deadline_ms = deadline.as_millis() as u64))]
    pub async fn execute_with_deadline<T: DeserializeOwned>(
        &self,
        operation: OperationKind,
        input: &RawInput,
        deadline: Duration,
    ) -> KraResult<VerificationResult<T>> {
        let attempts = AtomicU32::new(0);
        match tokio::time::timeout(deadline, self.run(operation, input, &attempts)).await {
            Ok(result) => result,
            Err(_) => {
                let started = attempts.load(Ordering::SeqCst);
                warn!(stage = %PipelineStage::Failed, attempts = started, "Deadline expired");
                Err(TimeoutError::new(operation.endpoint(), deadline, started).into())
            }
        }
    }

    async fn run<T: DeserializeOwned>(
        &self,
        operation: OperationKind,
        input: &RawInput,
        attempts: &AtomicU32,
    ) -> KraResult<VerificationResult<T>> {
        debug!(stage = %PipelineStage::Validating);
        let request = Validator::normalize(operation, input).inspect_err(|e| {
            debug!(stage = %PipelineStage::Failed, error = %e, "Validation failed");
        })?;
        let fingerprint = request.fingerprint().clone();

        if operation.is_cacheable() {
            debug!(stage = %PipelineStage::CacheCheck, fingerprint = %fingerprint);
            if let Some(hit) = self.cached(&fingerprint) {
                debug!(stage = %PipelineStage::Done, fingerprint = %fingerprint, "Cache hit");
                return Self::build_result(operation, fingerprint, hit, true);
            }
        }

        let response = self.fetch(&request, attempts).await.inspect_err(|e| {
            warn!(stage = %PipelineStage::Failed, error = %e, "Call failed");
        })?;
        let result = Self::build_result(operation, fingerprint.clone(), response.clone(), false)?;

        let ttl = self.cache_settings.ttl_for(operation);
        if operation.is_cacheable() && !ttl.is_zero() {
            debug!(stage = %PipelineStage::CacheStore, fingerprint = %fingerprint, ttl_secs = ttl.as_secs());
            self.lock_cache().set(fingerprint, response, ttl);
        }

        info!(stage = %PipelineStage::Done, "Call succeeded");
        Ok(result)
    }

    /// Attempts with per-attempt token acquisition and retry.
    async fn fetch(
        &self,
        request: &NormalizedRequest,
        attempts: &AtomicU32,
    ) -> KraResult<CachedResponse> {
        let base_request = TransportRequest::from_normalized(request);
        let endpoint = base_request.endpoint().clone();
        let retry_config = self.retry.config();

        let (result, context) = self
            .retry
            .execute_gated(
                &endpoint,
                |attempt| async move {
                    self.acquire_token(attempt).await?;
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), KraError>(())
                },
                |attempt| {
                    let transport_request = base_request.for_attempt(attempt);
                    async move {
                        debug!(stage = %PipelineStage::Attempting, attempt);
                        let response = self.transport.send(&transport_request).await?;
                        self.interpret(&transport_request, response)
                    }
                },
                |err: &KraError| {
                    let verdict = Classification::of(err, retry_config);
                    if verdict.retryable {
                        debug!(stage = %PipelineStage::Retry, error = %err);
                    }
                    verdict
                },
            )
            .await;

        debug!(attempts = context.attempt(), "Attempts finished");
        let envelope = result?;
        Ok(CachedResponse {
            envelope,
            fetched_at: Utc::now(),
        })
    }

    /// Take one token according to the configured strategy.
    async fn acquire_token(&self, attempt: u32) -> KraResult<()> {
        debug!(stage = %PipelineStage::RateLimitWait, attempt);
        match self.limiter.config().strategy() {
            RateLimitStrategy::Wait => {
                let waited = self.limiter.wait_and_acquire().await;
                if !waited.is_zero() {
                    debug!(attempt, wait_ms = waited.as_millis() as u64, "Throttled locally");
                }
                Ok(())
            }
            RateLimitStrategy::FailFast => self.limiter.acquire().map_err(|e| {
                debug!(attempt, wait_ms = e.wait().as_millis() as u64, "Token bucket empty, failing fast");
                KraError::from(e)
            }),
        }
    }

    /// Map a raw response onto the status taxonomy.
    fn interpret(
        &self,
        request: &TransportRequest,
        response: TransportResponse,
    ) -> KraResult<SuccessEnvelope> {
        let status = *response.status();
        if response.is_success() {
            return response.json::<SuccessEnvelope>();
        }

        let envelope: Option<ErrorEnvelope> = serde_json::from_str(response.body()).ok();
        let message = envelope
            .as_ref()
            .and_then(|e| e.error_message.clone())
            .or_else(|| {
                let body = response.body().trim();
                (!body.is_empty()).then(|| body.to_string())
            })
            .unwrap_or_else(|| format!("HTTP {status}"));

        let err = match status {
            401 | 403 => AuthenticationError::new(status, message).into(),
            408 => TimeoutError::new(
                request.endpoint().as_str(),
                self.retry.config().attempt_timeout(),
                *request.attempt(),
            )
            .into(),
            429 => {
                let wait = response
                    .retry_after()
                    .unwrap_or_else(|| self.retry.config().default_retry_after());
                RateLimitError::upstream(wait).into()
            }
            _ => {
                let mut upstream = UpstreamError::new(status, message);
                if let Some(code) = envelope.as_ref().and_then(|e| e.error_code.clone()) {
                    upstream = upstream.with_error_code(code);
                }
                let request_id = envelope
                    .and_then(|e| e.request_id)
                    .or_else(|| response.request_id().clone());
                if let Some(request_id) = request_id {
                    upstream = upstream.with_request_id(request_id);
                }
                upstream.into()
            }
        };
        debug!(status, error = %err, "Upstream returned an error status");
        Err(err)
    }

    fn build_result<T: DeserializeOwned>(
        operation: OperationKind,
        fingerprint: RequestFingerprint,
        response: CachedResponse,
        from_cache: bool,
    ) -> KraResult<VerificationResult<T>> {
        let CachedResponse {
            envelope,
            fetched_at,
        } = response;
        let data = serde_json::from_value(envelope.response_data).map_err(|e| {
            KraError::from(UpstreamError::new(
                200,
                format!("Unexpected {operation} response data: {e}"),
            ))
        })?;
        Ok(VerificationResult::new(
            operation,
            fingerprint,
            envelope.response_code,
            envelope.response_desc,
            data,
            from_cache,
            fetched_at,
        ))
    }

    fn lock_cache(&self) -> MutexGuard<'_, CacheManager<CachedResponse>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, fingerprint: &RequestFingerprint) -> Option<CachedResponse> {
        self.lock_cache().get(fingerprint.as_str()).cloned()
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
        debug!("Cache cleared");
    }

    /// Drop cached responses of one operation. Returns how many were removed.
    pub fn invalidate_operation(&self, operation: OperationKind) -> usize {
        let prefix = RequestFingerprint::prefix_for(operation);
        let removed = self.lock_cache().remove_pattern(|key| key.starts_with(&prefix));
        debug!(operation = %operation, removed, "Invalidated cached responses");
        removed
    }

    /// Drop one cached response. Returns whether it existed.
    pub fn invalidate(&self, fingerprint: &RequestFingerprint) -> bool {
        self.lock_cache().remove(fingerprint.as_str()).is_some()
    }

    /// Remove expired responses. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.lock_cache().cleanup_expired()
    }

    /// Cache occupancy, without side effects.
    pub fn cache_stats(&self) -> CacheStats {
        self.lock_cache().get_stats()
    }
}
