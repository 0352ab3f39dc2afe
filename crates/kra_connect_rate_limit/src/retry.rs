//! Retry with exponential backoff and jitter.
//!
//! [`RetryHandler::execute`] makes up to `max_retries + 1` attempts. Each
//! attempt runs under its own deadline; an expired deadline becomes a
//! retryable `TimeoutError`. Between attempts the handler sleeps for the
//! backoff from [`BackoffSchedule`]. When the failure carried an upstream
//! `Retry-After` hint, the next attempt does not start before the hint has
//! elapsed. When the budget is exhausted the last underlying error is
//! returned unchanged.

use crate::RetryConfig;
use derive_getters::Getters;
use kra_connect_error::{RetryableError, TimeoutError};
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

/// Verdict on one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Whether another attempt may succeed
    pub retryable: bool,
    /// Delay requested by the upstream, overriding the backoff
    pub retry_after: Option<Duration>,
}

impl Classification {
    /// Transient failure, use the normal backoff.
    pub fn retry() -> Self {
        Self {
            retryable: true,
            retry_after: None,
        }
    }

    /// Transient failure with an explicit delay.
    pub fn retry_after(delay: Duration) -> Self {
        Self {
            retryable: true,
            retry_after: Some(delay),
        }
    }

    /// Permanent failure.
    pub fn permanent() -> Self {
        Self {
            retryable: false,
            retry_after: None,
        }
    }

    /// Classify `err` under `config`.
    ///
    /// Authentication rejections (401/403) are permanent regardless of
    /// configuration. Otherwise an error is retried if it is intrinsically
    /// transient or its status is in `retryable_status_codes`. Upstream hints
    /// are capped at `max_retry_after`.
    pub fn of<E: RetryableError>(err: &E, config: &RetryConfig) -> Self {
        let status = err.status_code();
        if matches!(status, Some(401 | 403)) {
            return Self::permanent();
        }
        let retryable = err.is_retryable()
            || status.is_some_and(|code| config.retryable_status_codes().contains(&code));
        if !retryable {
            return Self::permanent();
        }
        match err.retry_after() {
            Some(hint) => Self::retry_after(hint.min(config.max_retry_after())),
            None => Self::retry(),
        }
    }
}

/// Delays between attempts, one item per retry.
///
/// # Example
///
/// ```
/// use kra_connect_rate_limit::{BackoffSchedule, RetryConfig};
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_initial_delay_ms(100)
///     .with_max_delay_ms(250)
///     .with_max_retries(4)
///     .with_jitter(false);
/// let delays: Vec<Duration> = BackoffSchedule::new(&config).collect();
/// assert_eq!(
///     delays,
///     [100, 200, 250, 250].map(Duration::from_millis).to_vec()
/// );
/// ```
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    config: RetryConfig,
    next_attempt: u32,
}

impl BackoffSchedule {
    /// Schedule for `config`, starting before attempt 2.
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            config: config.clone(),
            next_attempt: 2,
        }
    }

    /// Add up to 10% of `base`, uniformly.
    fn jittered(base: Duration) -> Duration {
        let extra = rand::thread_rng().gen_range(0.0..=0.1);
        base + base.mul_f64(extra)
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.next_attempt > self.config.max_attempts() {
            return None;
        }
        let base = self.config.base_delay(self.next_attempt);
        self.next_attempt += 1;
        Some(if *self.config.jitter() {
            Self::jittered(base)
        } else {
            base
        })
    }
}

/// What happened during one `execute` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct RetryContext {
    /// Attempts started (1-based count)
    attempt: u32,
    /// Display form of the most recent failure
    last_error: Option<String>,
    /// Delay scheduled before the next attempt, if one was scheduled
    next_delay: Option<Duration>,
}

/// Runs operations with per-attempt deadlines and retry.
#[derive(Debug, Clone, Default)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    /// Create a handler.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// The configuration this handler was built with.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. `classify` decides
    /// whether a failure is retried.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`, or a `TimeoutError`
    /// (converted into `E`) if the last attempt exceeded its deadline.
    pub async fn execute<T, E, F, Fut, C>(
        &self,
        endpoint: &str,
        operation: F,
        classify: C,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TimeoutError> + Display,
        C: Fn(&E) -> Classification,
    {
        self.execute_with_context(endpoint, operation, classify)
            .await
            .0
    }

    /// Like [`execute`](Self::execute), also returning the retry bookkeeping.
    pub async fn execute_with_context<T, E, F, Fut, C>(
        &self,
        endpoint: &str,
        operation: F,
        classify: C,
    ) -> (Result<T, E>, RetryContext)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TimeoutError> + Display,
        C: Fn(&E) -> Classification,
    {
        self.execute_gated(endpoint, |_| std::future::ready(Ok(())), operation, classify)
            .await
    }

    /// Like [`execute_with_context`](Self::execute_with_context), awaiting
    /// `gate` before every attempt.
    ///
    /// The gate runs outside the attempt deadline, so time spent in it (for
    /// example waiting for a rate-limit token) never counts against
    /// `attempt_timeout`. A gate error is classified like an attempt error.
    /// An upstream hint delays the next attempt, gate included, until the
    /// hint has elapsed since the failure; the backoff sleep counts toward it.
    #[instrument(skip(self, gate, operation, classify), fields(max_attempts = self.config.max_attempts()))]
    pub async fn execute_gated<T, E, G, GFut, F, Fut, C>(
        &self,
        endpoint: &str,
        mut gate: G,
        mut operation: F,
        classify: C,
    ) -> (Result<T, E>, RetryContext)
    where
        G: FnMut(u32) -> GFut,
        GFut: Future<Output = Result<(), E>>,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TimeoutError> + Display,
        C: Fn(&E) -> Classification,
    {
        let timeout = self.config.attempt_timeout();
        let max_attempts = self.config.max_attempts();
        let context = Mutex::new(RetryContext::default());
        let context_ref = &context;
        // Earliest start of the next attempt, set by an upstream hint
        let resume_at: Mutex<Option<Instant>> = Mutex::new(None);
        let resume_at = &resume_at;
        let classify = &classify;
        let base_delay = |attempt: u32| self.config.base_delay(attempt);
        let base_delay = &base_delay;

        let result = Retry::spawn(BackoffSchedule::new(&self.config), || {
            let attempt = {
                let mut ctx = context_ref.lock().unwrap_or_else(PoisonError::into_inner);
                ctx.attempt += 1;
                ctx.next_delay = None;
                ctx.attempt
            };
            let gate_future = gate(attempt);
            let attempt_future = operation(attempt);

            async move {
                let hinted = resume_at.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(deadline) = hinted
                    && deadline > Instant::now()
                {
                    debug!(attempt, "Waiting out upstream retry-after");
                    tokio::time::sleep_until(deadline).await;
                }

                let outcome = match gate_future.await {
                    Err(err) => Err(err),
                    Ok(()) => {
                        debug!(attempt, "Starting attempt");
                        match tokio::time::timeout(timeout, attempt_future).await {
                            Ok(outcome) => outcome,
                            Err(_) => Err(E::from(TimeoutError::new(endpoint, timeout, attempt))),
                        }
                    }
                };

                let err = match outcome {
                    Ok(value) => return Ok(value),
                    Err(err) => err,
                };

                let verdict = classify(&err);
                let has_budget = attempt < max_attempts;
                {
                    let mut ctx = context_ref.lock().unwrap_or_else(PoisonError::into_inner);
                    ctx.last_error = Some(err.to_string());
                    if verdict.retryable && has_budget {
                        let backoff = base_delay(attempt + 1);
                        ctx.next_delay = Some(verdict.retry_after.map_or(backoff, |hint| hint.max(backoff)));
                    }
                }
                if verdict.retryable
                    && has_budget
                    && let Some(hint) = verdict.retry_after
                {
                    *resume_at.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(Instant::now() + hint);
                }

                if verdict.retryable {
                    if has_budget {
                        warn!(attempt, error = %err, "Transient error, will retry");
                    } else {
                        warn!(attempt, error = %err, "Transient error, retry budget exhausted");
                    }
                    Err(RetryError::Transient {
                        err,
                        retry_after: None,
                    })
                } else {
                    warn!(attempt, error = %err, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(err))
                }
            }
        })
        .await;

        let context = context.into_inner().unwrap_or_else(PoisonError::into_inner);
        debug!(
            attempts = context.attempt,
            succeeded = result.is_ok(),
            "Retry loop finished"
        );
        (result, context)
    }
}
