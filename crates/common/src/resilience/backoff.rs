//! Exponential backoff with multiplicative jitter.
//!
//! `delay(n) = round(base_delay * 2^(n - 1) * factor)` where `factor` is drawn
//! uniformly from `[JITTER_MIN, JITTER_MAX]`. There is no
//! per-delay cap: callers bound the whole call with a total time budget.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

/// Lower bound of the jitter factor.
pub const JITTER_MIN: f64 = 0.8;

/// Upper bound of the jitter factor.
pub const JITTER_MAX: f64 = 1.2;

/// Largest exponent applied before the multiplication saturates anyway.
const MAX_EXPONENT: u32 = 63;

/// Source of the multiplicative jitter factor.
///
/// Implementations must return a value in `[JITTER_MIN, JITTER_MAX]`.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// Draw the next jitter factor.
    fn factor(&self) -> f64;
}

/// Uniform jitter drawn from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn factor(&self) -> f64 {
        rand::thread_rng().gen_range(JITTER_MIN..=JITTER_MAX)
    }
}

impl<J: JitterSource + ?Sized> JitterSource for Arc<J> {
    fn factor(&self) -> f64 {
        (**self).factor()
    }
}

/// Constant jitter factor for deterministic tests.
///
/// Values outside the allowed range are clamped into it.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(f64);

impl FixedJitter {
    /// Create a fixed jitter source.
    pub fn new(factor: f64) -> Self {
        let factor = if factor.is_nan() { 1.0 } else { factor.clamp(JITTER_MIN, JITTER_MAX) };
        Self(factor)
    }

    /// No jitter at all (factor 1.0).
    pub fn none() -> Self {
        Self(1.0)
    }
}

impl JitterSource for FixedJitter {
    fn factor(&self) -> f64 {
        self.0
    }
}

/// Backoff calculator: pure function of the attempt number and configuration.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    jitter: Arc<dyn JitterSource>,
}

impl ExponentialBackoff {
    /// Backoff with random jitter.
    pub fn new(base_delay: Duration) -> Self {
        Self::with_jitter(base_delay, RandomJitter)
    }

    /// Backoff with a custom jitter source.
    pub fn with_jitter<J: JitterSource + 'static>(base_delay: Duration, jitter: J) -> Self {
        Self { base_delay, jitter: Arc::new(jitter) }
    }

    /// Configured base delay (the un-jittered delay of attempt 1).
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Un-jittered delay after `attempt` (1-based; 0 is treated as 1).
    pub fn unjittered(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
        let base_millis = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_millis.saturating_mul(1u64 << exponent))
    }

    /// Jittered delay to sleep before the attempt following `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.unjittered(attempt).as_millis() as f64;
        let jittered = (base * self.jitter.factor()).round();

        if !jittered.is_finite() || jittered >= u64::MAX as f64 {
            Duration::from_millis(u64::MAX)
        } else {
            Duration::from_millis(jittered.max(0.0) as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(base: Duration) -> (Duration, Duration) {
        let millis = base.as_millis() as f64;
        (
            Duration::from_millis((millis * JITTER_MIN).floor() as u64),
            Duration::from_millis((millis * JITTER_MAX).ceil() as u64),
        )
    }

    #[test]
    fn unjittered_delay_doubles_each_attempt() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(1_000));

        assert_eq!(backoff.unjittered(1), Duration::from_millis(1_000));
        assert_eq!(backoff.unjittered(2), Duration::from_millis(2_000));
        assert_eq!(backoff.unjittered(3), Duration::from_millis(4_000));
        assert_eq!(backoff.unjittered(4), Duration::from_millis(8_000));
    }

    #[test]
    fn attempt_zero_is_treated_as_first_attempt() {
        let backoff = ExponentialBackoff::with_jitter(Duration::from_millis(50), FixedJitter::none());
        assert_eq!(backoff.delay(0), backoff.delay(1));
    }

    #[test]
    fn random_delay_stays_within_jitter_bounds() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(1_000));

        for attempt in 1..=8 {
            let (low, high) = bounds(backoff.unjittered(attempt));
            for _ in 0..200 {
                let delay = backoff.delay(attempt);
                assert!(delay >= low && delay <= high, "attempt {attempt}: {delay:?} out of range");
            }
        }
    }

    #[test]
    fn fixed_jitter_scales_and_rounds() {
        let low = ExponentialBackoff::with_jitter(Duration::from_millis(10), FixedJitter::new(0.8));
        let high = ExponentialBackoff::with_jitter(Duration::from_millis(10), FixedJitter::new(1.2));
        let odd = ExponentialBackoff::with_jitter(Duration::from_millis(7), FixedJitter::new(1.1));

        assert_eq!(low.delay(1), Duration::from_millis(8));
        assert_eq!(high.delay(3), Duration::from_millis(48));
        // 7 * 1.1 = 7.7 -> 8
        assert_eq!(odd.delay(1), Duration::from_millis(8));
    }

    #[test]
    fn shared_jitter_source_delegates() {
        let shared: Arc<dyn JitterSource> = Arc::new(FixedJitter::new(1.2));
        let backoff = ExponentialBackoff::with_jitter(Duration::from_millis(100), shared);
        assert_eq!(backoff.delay(2), Duration::from_millis(240));
    }

    #[test]
    fn fixed_jitter_is_clamped_into_range() {
        assert!((FixedJitter::new(5.0).factor() - JITTER_MAX).abs() < f64::EPSILON);
        assert!((FixedJitter::new(0.0).factor() - JITTER_MIN).abs() < f64::EPSILON);
        assert!((FixedJitter::new(f64::NAN).factor() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn huge_attempt_numbers_saturate_instead_of_panicking() {
        let backoff = ExponentialBackoff::with_jitter(Duration::from_secs(1), FixedJitter::new(1.2));

        assert_eq!(backoff.unjittered(u32::MAX), Duration::from_millis(u64::MAX));
        assert_eq!(backoff.delay(200), Duration::from_millis(u64::MAX));
    }
}
