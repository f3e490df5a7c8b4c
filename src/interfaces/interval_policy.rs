// ============================================================================
// Interval Policy Interface
// Decides how long the run loop waits before the next attempt
// ============================================================================

use crate::domain::EngineSnapshot;
use std::time::Duration;

/// Interval function consulted before every scheduling decision.
///
/// Receives the engine state after the attempt that just finished and the
/// run time elapsed since the runner was last started. Returning a growing
/// delay implements backoff; a shrinking one implements acceleration. Any
/// `Fn(&EngineSnapshot, Duration) -> Duration` closure qualifies.
///
/// Called with the runner's lock held: implementations must not call back
/// into the runner.
pub trait IntervalPolicy: Send + Sync {
    fn next_delay(&self, snapshot: &EngineSnapshot, elapsed: Duration) -> Duration;
}

impl<F> IntervalPolicy for F
where
    F: Fn(&EngineSnapshot, Duration) -> Duration + Send + Sync,
{
    fn next_delay(&self, snapshot: &EngineSnapshot, elapsed: Duration) -> Duration {
        self(snapshot, elapsed)
    }
}
