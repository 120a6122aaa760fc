//! API client with circuit breaker and retry logic
//!
//! Typed entry point for the Quill API. Domain methods validate their input,
//! then delegate to the [`RequestExecutor`] with a fixed resource path and a
//! JSON body. Validation failures never reach the breaker or the metrics.

use std::sync::Arc;
use std::time::Duration;

use quill_common::resilience::{
    BreakerSnapshot, CircuitState, Clock, ExponentialBackoff, JitterSource, RandomJitter,
    RequestMetrics, SystemClock,
};
use quill_domain::constants::{ANALYZE_ESSAY_PATH, GENERATE_QUESTIONS_PATH, HEALTH_PATH};
use quill_domain::{EssayAnalysis, EssayAnalysisRequest, GeneratedQuestions, QuestionGenerationRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::config::ClientConfig;
use super::errors::ApiError;
use super::executor::RequestExecutor;
use super::transport::{RequestOptions, Transport, TransportRequest};
use crate::http::HttpClient;

/// Upper bound for a health probe, on top of the configured total budget
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// API client with resilience patterns
///
/// Owns one circuit breaker and one metrics collector for its lifetime; all
/// concurrent calls through the same client share them.
pub struct ApiClient<C: Clock + Clone = SystemClock> {
    config: ClientConfig,
    executor: RequestExecutor<C>,
}

impl ApiClient {
    /// Create a client over the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::builder().config(config).build()
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }
}

impl<C: Clock + Clone> ApiClient<C> {
    /// Configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a resilient call and return the raw 2xx body.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::execute`].
    pub async fn execute(&self, resource: &str, options: &RequestOptions) -> Result<String, ApiError> {
        self.executor.execute(resource, options).await
    }

    /// POST `body` as JSON and decode the 2xx response as `R`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `R = ()` accepts 204s.
    ///
    /// # Errors
    ///
    /// Executor errors, or [`ApiError::Decode`] if the body does not match `R`
    /// (the call has already been counted as a success by then).
    #[instrument(skip(self, body))]
    pub async fn execute_json<B, R>(&self, resource: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let options = RequestOptions::post_json(body)?;
        let raw = self.executor.execute(resource, &options).await?;
        let text = if raw.trim().is_empty() { "null" } else { raw.as_str() };

        serde_json::from_str(text).map_err(|e| {
            warn!(error = %e, "response body did not match the expected shape");
            ApiError::Decode(e.to_string())
        })
    }

    /// Request feedback on an essay.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for a blank essay, before any network
    /// activity; otherwise see [`Self::execute_json`].
    #[instrument(skip(self, request), fields(essay_len = request.essay_text.len()))]
    pub async fn analyze_essay(&self, request: &EssayAnalysisRequest) -> Result<EssayAnalysis, ApiError> {
        request.validate()?;
        let analysis: EssayAnalysis = self.execute_json(ANALYZE_ESSAY_PATH, request).await?;
        info!(score = ?analysis.overall_score, "essay analysed");
        Ok(analysis)
    }

    /// Generate study questions from source text.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`] for blank text or an out-of-range count;
    /// otherwise see [`Self::execute_json`].
    #[instrument(skip(self, request), fields(count = ?request.count))]
    pub async fn generate_questions(
        &self,
        request: &QuestionGenerationRequest,
    ) -> Result<GeneratedQuestions, ApiError> {
        request.validate()?;
        let generated: GeneratedQuestions = self.execute_json(GENERATE_QUESTIONS_PATH, request).await?;
        info!(questions = generated.questions.len(), "questions generated");
        Ok(generated)
    }

    /// Health check for API
    ///
    /// A single `GET /health` that bypasses the breaker, the retry loop and
    /// the metrics.
    ///
    /// # Returns
    ///
    /// `true` on a 2xx response, `false` on any other status
    ///
    /// # Errors
    ///
    /// [`ApiError::Network`] if the exchange fails, [`ApiError::Timeout`] if
    /// it does not finish in time
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool, ApiError> {
        let url = self.executor.resolve(HEALTH_PATH)?;
        let request = TransportRequest::new(url, &RequestOptions::get());
        let timeout = self.executor.total_timeout().min(HEALTH_CHECK_TIMEOUT);
        let clock = self.executor.clock();
        let started = clock.now();

        debug!(url = %request.url, "Health check");

        let response = tokio::time::timeout(timeout, self.executor.transport().send(&request))
            .await
            .map_err(|_| {
                warn!("Health check timeout");
                ApiError::Timeout { elapsed: clock.elapsed_since(started), attempts: 1 }
            })?;

        match response {
            Ok(resp) if resp.is_success() => {
                info!("API is healthy");
                Ok(true)
            }
            Ok(resp) => {
                warn!(status = resp.status, "API returned non-success status");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Health check failed");
                Err(e.into())
            }
        }
    }

    /// Snapshot of the request counters and latency samples.
    pub fn get_metrics(&self) -> RequestMetrics {
        self.executor.metrics()
    }

    /// Clear all counters and latency samples; breaker state is untouched.
    pub fn reset_metrics(&self) {
        self.executor.reset_metrics();
    }

    /// Force the breaker to CLOSED with a zero failure count.
    pub fn reset_circuit_breaker(&self) {
        self.executor.reset_circuit_breaker();
    }

    /// Current breaker state, without evaluating the cooldown.
    pub fn circuit_state(&self) -> CircuitState {
        self.executor.circuit_state()
    }

    /// Full view of the breaker runtime.
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.executor.breaker_snapshot()
    }
}

/// Builder for API client
pub struct ApiClientBuilder<C: Clock + Clone = SystemClock> {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    jitter: Option<Arc<dyn JitterSource>>,
    clock: C,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self { config: None, transport: None, jitter: None, clock: SystemClock }
    }
}

impl<C: Clock + Clone> ApiClientBuilder<C> {
    /// Set the client configuration (defaults otherwise)
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the reqwest transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the random backoff jitter
    pub fn jitter<J: JitterSource + 'static>(mut self, jitter: J) -> Self {
        self.jitter = Some(Arc::new(jitter));
        self
    }

    /// Drive the breaker cooldown, deadline and latencies from `clock`
    pub fn clock<C2: Clock + Clone>(self, clock: C2) -> ApiClientBuilder<C2> {
        ApiClientBuilder {
            config: self.config,
            transport: self.transport,
            jitter: self.jitter,
            clock,
        }
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or client creation fails
    pub fn build(self) -> Result<ApiClient<C>, ApiError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let mut http = HttpClient::builder();
                if let Some(agent) = &config.user_agent {
                    http = http.user_agent(agent.clone());
                }
                Arc::new(http.build()?)
            }
        };
        let jitter = self.jitter.unwrap_or_else(|| Arc::new(RandomJitter));
        let backoff = ExponentialBackoff::with_jitter(config.base_delay, jitter);
        let executor = RequestExecutor::new(&config, transport, backoff, self.clock)?;

        info!(
            base_url = %executor.base_url(),
            max_retries = config.max_retries,
            circuit_breaker_threshold = config.circuit_breaker_threshold,
            "API client created"
        );
        Ok(ApiClient { config, executor })
    }
}
