// ============================================================================
// Interval Strategies
// Ready-made delay functions for the run loop
// ============================================================================

use crate::domain::EngineSnapshot;
use crate::interfaces::IntervalPolicy;
use std::time::Duration;

/// Same delay between every attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval(pub Duration);

impl IntervalPolicy for FixedInterval {
    fn next_delay(&self, _snapshot: &EngineSnapshot, _elapsed: Duration) -> Duration {
        self.0
    }
}

/// Backoff: the delay grows linearly with the runner's elapsed run time.
///
/// ```text
/// delay = min(initial + step * elapsed_secs, max)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    pub initial: Duration,
    /// Added per second of run time
    pub step: Duration,
    pub max: Duration,
}

impl IntervalPolicy for LinearBackoff {
    fn next_delay(&self, _snapshot: &EngineSnapshot, elapsed: Duration) -> Duration {
        let grown = self.step.mul_f64(elapsed.as_secs_f64());
        self.initial.saturating_add(grown).min(self.max)
    }
}

/// Acceleration: the delay shrinks as the longest wait in the pool grows.
///
/// ```text
/// delay = max(base - factor * oldest_wait, min)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accelerating {
    pub base: Duration,
    pub min: Duration,
    /// Fraction of the oldest wait taken off the base delay
    pub factor: f64,
}

impl IntervalPolicy for Accelerating {
    fn next_delay(&self, snapshot: &EngineSnapshot, _elapsed: Duration) -> Duration {
        let oldest = snapshot.oldest_wait.unwrap_or_default();
        let reduction = oldest.mul_f64(self.factor.max(0.0));
        self.base.saturating_sub(reduction).max(self.min)
    }
}
