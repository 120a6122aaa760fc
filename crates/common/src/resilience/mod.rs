//! Resilience primitives for the Quill client core
//!
//! - **Clock**: injectable monotonic time ([`SystemClock`], [`MockClock`])
//! - **Backoff**: exponential delay with multiplicative jitter
//! - **Circuit Breaker**: consecutive-failure breaker with a lazy, single-probe
//!   half-open state
//! - **Metrics**: request counters and latency samples
//!
//! These are generic building blocks. The request executor in `quill-infra`
//! wires them together around an HTTP transport.

pub mod backoff;
pub mod circuit_breaker;
pub mod clock;
pub mod metrics;

pub use backoff::{ExponentialBackoff, FixedJitter, JitterSource, RandomJitter, JITTER_MAX, JITTER_MIN};
pub use circuit_breaker::{
    BreakerRejection, BreakerSnapshot, CallPermit, CircuitBreaker, CircuitBreakerBuilderWithClock,
    CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitState, ConfigError, ConfigResult,
};
pub use clock::{Clock, MockClock, SystemClock};
pub use metrics::{MetricsCollector, RequestMetrics, RequestOutcome};
