//! Request-level metrics for the resilient executor
//!
//! Counters and latency samples live behind a single mutex so a snapshot
//! always observes a consistent set: once every in-flight call has reached a
//! terminal outcome, `total == successful + failed` and there is exactly one
//! latency sample per counted request.
//!
//! Metrics and breaker state are independent: [`MetricsCollector::reset`]
//! never touches a circuit breaker.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

/// Terminal outcome of one top-level request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    Failure,
}

#[derive(Debug, Default)]
struct MetricsState {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    retried_requests: u64,
    circuit_open_events: u64,
    rejected_requests: u64,
    latencies: Vec<Duration>,
}

/// Snapshot of the collected metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetrics {
    /// Requests that reached a terminal outcome
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Retry attempts (not requests)
    pub retried_requests: u64,
    /// Transitions into the Open state
    pub circuit_open_events: u64,
    /// Calls refused by the breaker without reaching the transport; these
    /// are not part of `total_requests`
    pub rejected_requests: u64,
    /// One entry per counted request, in completion order
    pub latencies: Vec<Duration>,
    /// Arithmetic mean of `latencies` (zero when empty)
    pub average_latency: Duration,
}

impl RequestMetrics {
    /// Nearest-rank percentile for `quantile` in `[0.0, 1.0]`.
    pub fn percentile(&self, quantile: f64) -> Option<Duration> {
        if self.latencies.is_empty() || quantile.is_nan() {
            return None;
        }

        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();

        let quantile = quantile.clamp(0.0, 1.0);
        let rank = (quantile * sorted.len() as f64).ceil() as usize;
        sorted.get(rank.saturating_sub(1)).copied()
    }

    /// Fraction of counted requests that succeeded (0.0 when none).
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

/// Thread-safe collector shared by all calls of one client.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    state: Mutex<MetricsState>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the terminal outcome of a request and its wall-clock latency.
    pub fn record(&self, outcome: RequestOutcome, latency: Duration) {
        let mut state = self.lock_state();
        state.total_requests += 1;
        match outcome {
            RequestOutcome::Success => state.successful_requests += 1,
            RequestOutcome::Failure => state.failed_requests += 1,
        }
        state.latencies.push(latency);
    }

    /// Record one retry attempt.
    pub fn retry(&self) {
        self.lock_state().retried_requests += 1;
    }

    /// Record a transition into the Open state.
    pub fn circuit_opened(&self) {
        self.lock_state().circuit_open_events += 1;
    }

    /// Record a call refused by the breaker.
    pub fn rejected(&self) {
        self.lock_state().rejected_requests += 1;
    }

    /// Consistent copy of every counter plus the derived average.
    pub fn snapshot(&self) -> RequestMetrics {
        let state = self.lock_state();
        let average_latency = if state.latencies.is_empty() {
            Duration::ZERO
        } else {
            let total: Duration = state.latencies.iter().sum();
            total / u32::try_from(state.latencies.len()).unwrap_or(u32::MAX)
        };

        RequestMetrics {
            total_requests: state.total_requests,
            successful_requests: state.successful_requests,
            failed_requests: state.failed_requests,
            retried_requests: state.retried_requests,
            circuit_open_events: state.circuit_open_events,
            rejected_requests: state.rejected_requests,
            latencies: state.latencies.clone(),
            average_latency,
        }
    }

    /// Zero every counter and drop all latency samples.
    pub fn reset(&self) {
        *self.lock_state() = MetricsState::default();
        debug!("request metrics reset");
    }

    fn lock_state(&self) -> MutexGuard<'_, MetricsState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(metric = "MetricsCollector", "Mutex poisoned, recovering data");
                poisoned.into_inner()
            }
        }
    }
}
