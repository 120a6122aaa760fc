//! Modular common utilities shared across Quill crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: serde helpers
//! - `runtime`: resilience primitives (clock, backoff, circuit breaker,
//!   request metrics)
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod utils;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{
    BreakerRejection, BreakerSnapshot, CallPermit, CircuitBreaker, CircuitBreakerConfig,
    CircuitBreakerConfigBuilder, CircuitState, Clock, ConfigError, ExponentialBackoff,
    FixedJitter, JitterSource, MetricsCollector, MockClock, RandomJitter, RequestMetrics,
    RequestOutcome, SystemClock,
};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_millis;
