//! Resilient request execution
//!
//! [`RequestExecutor::execute`] runs one top-level call:
//!
//! 1. Fix the deadline (`now + total_timeout`).
//! 2. Ask the circuit breaker for a permit; a refusal fails fast with
//!    [`ApiError::CircuitOpen`] and only bumps `rejected_requests`.
//! 3. Attempt the transport call, racing it against the remaining budget.
//!    2xx succeeds, 4xx (except 429) is terminal, 429/5xx/network failures
//!    are retried with exponential backoff until `max_retries` is exhausted or
//!    the deadline passes.
//! 4. Report the terminal outcome to the breaker once and record exactly one
//!    request plus one latency sample.
//!
//! No lock is held across the transport call or the backoff sleep; breaker
//! and metrics are touched only at admission, per retry and at the end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use quill_common::resilience::{
    BreakerSnapshot, CircuitBreaker, CircuitState, Clock, ExponentialBackoff, MetricsCollector,
    RequestMetrics, RequestOutcome, SystemClock,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::config::ClientConfig;
use super::errors::ApiError;
use super::transport::{RequestOptions, Transport, TransportError, TransportRequest, TransportResponse};

/// Classification of a single transport attempt
#[derive(Debug)]
enum AttemptOutcome {
    Success(String),
    RetryableFailure(ApiError),
    TerminalFailure(ApiError),
}

impl AttemptOutcome {
    fn classify(url: &Url, result: Result<TransportResponse, TransportError>) -> Self {
        match result {
            Ok(response) if response.is_success() => Self::Success(response.body),
            Ok(response) => {
                let err = ApiError::from_status(response.status, url.as_str(), &response.body);
                if err.is_retryable() {
                    Self::RetryableFailure(err)
                } else {
                    Self::TerminalFailure(err)
                }
            }
            Err(err) => Self::RetryableFailure(err.into()),
        }
    }
}

/// Retry loop, breaker and metrics around a [`Transport`]
pub struct RequestExecutor<C: Clock + Clone = SystemClock> {
    base_url: Url,
    max_retries: u32,
    total_timeout: Duration,
    backoff: ExponentialBackoff,
    breaker: CircuitBreaker<C>,
    metrics: MetricsCollector,
    transport: Arc<dyn Transport>,
    clock: C,
}

impl<C: Clock + Clone> RequestExecutor<C> {
    /// Build an executor from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the configuration is invalid.
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        backoff: ExponentialBackoff,
        clock: C,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;
        let breaker = CircuitBreaker::with_clock(config.breaker_config(), clock.clone())
            .map_err(|e| ApiError::Config(format!("Failed to create circuit breaker: {e}")))?;

        Ok(Self {
            base_url,
            max_retries: config.max_retries,
            total_timeout: config.total_timeout,
            backoff,
            breaker,
            metrics: MetricsCollector::new(),
            transport,
            clock,
        })
    }

    /// Resolve `resource` (with or without a leading `/`) under the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the result is not a valid URL.
    pub fn resolve(&self, resource: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(resource.trim_start_matches('/'))
            .map_err(|e| ApiError::Validation(format!("Invalid resource {resource:?}: {e}")))
    }

    /// Run one resilient call and return the 2xx response body.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Validation`] for a malformed header or resource, before
    ///   the breaker is consulted
    /// - [`ApiError::CircuitOpen`] when the breaker refuses the call
    /// - [`ApiError::Http`] for a terminal status, or the last retryable one
    ///   once retries are exhausted
    /// - [`ApiError::Network`] when the last attempt failed at transport level
    /// - [`ApiError::Timeout`] when the total budget ran out
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn execute(&self, resource: &str, options: &RequestOptions) -> Result<String, ApiError> {
        let started = self.clock.now();
        let deadline = started + self.total_timeout;
        options.validate()?;
        let request = TransportRequest::new(self.resolve(resource)?, options);

        let permit = match self.breaker.try_acquire() {
            Ok(permit) => permit,
            Err(rejection) => {
                self.metrics.rejected();
                warn!(state = %rejection.state, "circuit breaker rejected request");
                return Err(ApiError::CircuitOpen { state: rejection.state });
            }
        };

        let result = self.attempt_until_terminal(&request, started, deadline).await;
        let latency = self.clock.elapsed_since(started);

        match result {
            Ok(body) => {
                permit.succeed();
                self.metrics.record(RequestOutcome::Success, latency);
                debug!(latency_ms = latency.as_millis() as u64, "request succeeded");
                Ok(body)
            }
            Err(err) => {
                if permit.fail() {
                    self.metrics.circuit_opened();
                }
                self.metrics.record(RequestOutcome::Failure, latency);
                warn!(
                    error = %err,
                    latency_ms = latency.as_millis() as u64,
                    consecutive_failures = self.breaker.consecutive_failures(),
                    "request failed"
                );
                Err(err)
            }
        }
    }

    async fn attempt_until_terminal(
        &self,
        request: &TransportRequest,
        started: Instant,
        deadline: Instant,
    ) -> Result<String, ApiError> {
        let mut attempt: u32 = 1;

        loop {
            let now = self.clock.now();
            if now >= deadline {
                return Err(self.timed_out(started, attempt - 1));
            }
            let remaining = deadline - now;

            debug!(attempt, url = %request.url, "sending attempt");
            let sent = tokio::time::timeout(remaining, self.transport.send(request)).await;
            let Ok(result) = sent else {
                // The in-flight exchange is dropped with the timed-out future.
                return Err(self.timed_out(started, attempt));
            };

            let failure = match AttemptOutcome::classify(&request.url, result) {
                AttemptOutcome::Success(body) => return Ok(body),
                AttemptOutcome::TerminalFailure(err) => return Err(err),
                AttemptOutcome::RetryableFailure(err) => err,
            };

            if attempt > self.max_retries {
                debug!(attempt, error = %failure, "retries exhausted");
                return Err(failure);
            }

            self.metrics.retry();
            let delay = self.backoff.delay(attempt);
            let pause = delay.min(deadline.saturating_duration_since(self.clock.now()));
            debug!(
                attempt,
                delay_ms = pause.as_millis() as u64,
                reason = %failure,
                "scheduling retry"
            );
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            attempt += 1;
        }
    }

    fn timed_out(&self, started: Instant, attempts: u32) -> ApiError {
        ApiError::Timeout { elapsed: self.clock.elapsed_since(started), attempts }
    }

    /// Snapshot of the request counters and latency samples.
    pub fn metrics(&self) -> RequestMetrics {
        self.metrics.snapshot()
    }

    /// Zero every counter; breaker state is untouched.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
        info!("request metrics reset");
    }

    /// Force the breaker closed with a zero failure count.
    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }

    /// Current breaker state, without evaluating the cooldown.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Full view of the breaker runtime.
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Normalised base URL every resource resolves under.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn total_timeout(&self) -> Duration {
        self.total_timeout
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }
}
