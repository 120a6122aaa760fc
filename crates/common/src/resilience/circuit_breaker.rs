//! Consecutive-failure circuit breaker
//!
//! # States
//! - Closed: calls pass through, failures are counted
//! - Open: calls are rejected without touching the dependency
//! - Half-Open: a single probe call decides between Closed and Open
//!
//! # State Transitions
//! ```text
//! Closed    → Open:      consecutive_failures >= failure_threshold
//! Open      → Half-Open: first call after open_timeout (lazy, no timer)
//! Half-Open → Closed:    probe succeeds
//! Half-Open → Open:      probe fails (opened_at refreshed)
//! any       → Closed:    reset()
//! ```
//!
//! All runtime fields live behind one mutex so the expiry check, the
//! Open → Half-Open transition and the probe grant happen atomically. The lock
//! is never held while the protected call runs: callers take a [`CallPermit`]
//! and resolve it once the call reached its terminal outcome.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};

/// Default number of consecutive failures that opens the circuit.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default cooldown before an open circuit admits a probe.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration validation error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, admitting a single probe
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Cooldown before an open circuit lets a probe through
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: DEFAULT_FAILURE_THRESHOLD, open_timeout: DEFAULT_OPEN_TIMEOUT }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.open_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "open_timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for [`CircuitBreakerConfig`]
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = timeout;
        self
    }

    /// Switch to building a breaker directly, driven by `clock`.
    pub fn clock<C: Clock>(self, clock: C) -> CircuitBreakerBuilderWithClock<C> {
        CircuitBreakerBuilderWithClock { config: self.config, clock }
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Builder with custom clock that builds a [`CircuitBreaker`] directly
pub struct CircuitBreakerBuilderWithClock<C: Clock> {
    config: CircuitBreakerConfig,
    clock: C,
}

impl<C: Clock> CircuitBreakerBuilderWithClock<C> {
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.config.open_timeout = timeout;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreaker<C>> {
        CircuitBreaker::with_clock(self.config, self.clock)
    }
}

/// A call refused by the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerRejection {
    /// State that caused the rejection (`Open`, or `HalfOpen` with a probe
    /// already in flight)
    pub state: CircuitState,
}

/// Point-in-time view of the breaker runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub opened_at: Option<Instant>,
    pub probe_in_flight: bool,
}

#[derive(Debug)]
struct BreakerRuntime {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    /// Bumped on every Open → Half-Open transition; ties a probe permit to
    /// the half-open episode that granted it.
    probe_generation: u64,
}

impl BreakerRuntime {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
            probe_generation: 0,
        }
    }

    fn trip(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.probe_in_flight = false;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.probe_in_flight = false;
    }

    fn owns_probe(&self, generation: Option<u64>) -> bool {
        self.state == CircuitState::HalfOpen
            && self.probe_in_flight
            && generation == Some(self.probe_generation)
    }
}

/// Circuit breaker shared by every call issued through one client.
///
/// Cloning yields another handle onto the same state.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    runtime: Arc<Mutex<BreakerRuntime>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &snapshot.state)
            .field("consecutive_failures", &snapshot.consecutive_failures)
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            runtime: Arc::clone(&self.runtime),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a breaker on the system clock
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Start building a breaker
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

impl Default for CircuitBreaker<SystemClock> {
    fn default() -> Self {
        Self {
            config: CircuitBreakerConfig::default(),
            runtime: Arc::new(Mutex::new(BreakerRuntime::closed())),
            clock: Arc::new(SystemClock),
        }
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a breaker driven by a custom clock (useful for testing)
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            runtime: Arc::new(Mutex::new(BreakerRuntime::closed())),
            clock: Arc::new(clock),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Ask to run one call.
    ///
    /// An expired Open state turns Half-Open here and the caller receives the
    /// probe permit; every other caller is rejected until the probe resolves.
    pub fn try_acquire(&self) -> Result<CallPermit<'_, C>, BreakerRejection> {
        let mut runtime = self.lock_runtime();
        let state = runtime.state;

        match state {
            CircuitState::Closed => Ok(CallPermit::new(self, None)),
            CircuitState::Open => {
                let expired = runtime.opened_at.map_or(true, |opened_at| {
                    self.clock.elapsed_since(opened_at) >= self.config.open_timeout
                });
                if !expired {
                    debug!(%state, "circuit breaker rejecting call");
                    return Err(BreakerRejection { state: CircuitState::Open });
                }

                runtime.state = CircuitState::HalfOpen;
                runtime.opened_at = None;
                runtime.probe_in_flight = true;
                runtime.probe_generation = runtime.probe_generation.wrapping_add(1);
                info!(
                    from = %CircuitState::Open,
                    to = %CircuitState::HalfOpen,
                    "circuit breaker cooldown elapsed, admitting probe"
                );
                Ok(CallPermit::new(self, Some(runtime.probe_generation)))
            }
            CircuitState::HalfOpen => {
                if runtime.probe_in_flight {
                    debug!(%state, "probe in flight, rejecting call");
                    return Err(BreakerRejection { state: CircuitState::HalfOpen });
                }
                runtime.probe_in_flight = true;
                Ok(CallPermit::new(self, Some(runtime.probe_generation)))
            }
        }
    }

    /// Current state, without evaluating the cooldown.
    pub fn state(&self) -> CircuitState {
        self.lock_runtime().state
    }

    /// Current consecutive failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock_runtime().consecutive_failures
    }

    /// Snapshot of the runtime fields.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let runtime = self.lock_runtime();
        BreakerSnapshot {
            state: runtime.state,
            consecutive_failures: runtime.consecutive_failures,
            opened_at: runtime.opened_at,
            probe_in_flight: runtime.probe_in_flight,
        }
    }

    /// Force the breaker closed, whatever its current state.
    pub fn reset(&self) {
        let mut runtime = self.lock_runtime();
        let previous = runtime.state;
        runtime.close();
        info!(from = %previous, to = %CircuitState::Closed, "circuit breaker manually reset");
    }

    fn on_success(&self, probe: Option<u64>) {
        let mut runtime = self.lock_runtime();
        let state = runtime.state;
        let owns_probe = runtime.owns_probe(probe);

        match state {
            CircuitState::Closed => runtime.consecutive_failures = 0,
            CircuitState::HalfOpen if owns_probe => {
                runtime.close();
                info!(
                    from = %CircuitState::HalfOpen,
                    to = %CircuitState::Closed,
                    "probe succeeded, circuit breaker closed"
                );
            }
            state => debug!(%state, "ignoring late success"),
        }
    }

    /// Returns `true` when this failure moved the breaker into Open.
    fn on_failure(&self, probe: Option<u64>) -> bool {
        let now = self.clock.now();
        let mut runtime = self.lock_runtime();
        runtime.consecutive_failures = runtime.consecutive_failures.saturating_add(1);
        let state = runtime.state;
        let threshold_reached = runtime.consecutive_failures >= self.config.failure_threshold;
        let owns_probe = runtime.owns_probe(probe);

        match state {
            CircuitState::Closed if threshold_reached => {
                runtime.trip(now);
                warn!(
                    from = %CircuitState::Closed,
                    to = %CircuitState::Open,
                    consecutive_failures = runtime.consecutive_failures,
                    "circuit breaker opened"
                );
                true
            }
            CircuitState::HalfOpen if owns_probe => {
                runtime.trip(now);
                warn!(
                    from = %CircuitState::HalfOpen,
                    to = %CircuitState::Open,
                    consecutive_failures = runtime.consecutive_failures,
                    "probe failed, circuit breaker re-opened"
                );
                true
            }
            _ => false,
        }
    }

    fn on_abandon(&self, probe: Option<u64>) {
        let mut runtime = self.lock_runtime();
        if runtime.owns_probe(probe) {
            runtime.probe_in_flight = false;
            debug!("probe abandoned before completion, slot released");
        }
    }

    fn lock_runtime(&self) -> MutexGuard<'_, BreakerRuntime> {
        match self.runtime.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("circuit breaker lock poisoned, recovering state");
                poisoned.into_inner()
            }
        }
    }
}

/// Permission to run one call through the breaker.
///
/// Resolve it with [`succeed`](Self::succeed) or [`fail`](Self::fail) once the
/// call reached its terminal outcome. Dropping it unresolved (for example
/// when the calling future is cancelled) leaves the counters untouched and
/// frees the half-open probe slot.
#[must_use = "an unresolved permit records neither success nor failure"]
pub struct CallPermit<'a, C: Clock = SystemClock> {
    breaker: &'a CircuitBreaker<C>,
    probe: Option<u64>,
    resolved: bool,
}

impl<'a, C: Clock> CallPermit<'a, C> {
    fn new(breaker: &'a CircuitBreaker<C>, probe: Option<u64>) -> Self {
        Self { breaker, probe, resolved: false }
    }

    /// Whether this permit is the half-open probe.
    pub fn is_probe(&self) -> bool {
        self.probe.is_some()
    }

    /// Report a successful call.
    pub fn succeed(mut self) {
        self.resolved = true;
        self.breaker.on_success(self.probe);
    }

    /// Report a failed call. Returns `true` if the breaker opened as a result.
    pub fn fail(mut self) -> bool {
        self.resolved = true;
        self.breaker.on_failure(self.probe)
    }
}

impl<C: Clock> Drop for CallPermit<'_, C> {
    fn drop(&mut self) {
        if !self.resolved {
            self.breaker.on_abandon(self.probe);
        }
    }
}

impl<C: Clock> fmt::Debug for CallPermit<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallPermit").field("probe", &self.probe).finish()
    }
}
