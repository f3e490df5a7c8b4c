// ============================================================================
// Pair Handler Interface
// Receives every pair the run loop forms
// ============================================================================

use crate::domain::PoolEntry;
use std::fmt::Debug;

/// Pair-formed callback.
///
/// Invoked exactly once per pair, after the pair has left the pool. What
/// "forming a match" means downstream (sessions, notifications) is up to the
/// implementation. Any `Fn(PoolEntry<P>, PoolEntry<P>)` closure qualifies.
pub trait PairHandler<P>: Send + Sync {
    fn on_pair(&self, first: PoolEntry<P>, second: PoolEntry<P>);
}

impl<P, F> PairHandler<P> for F
where
    F: Fn(PoolEntry<P>, PoolEntry<P>) + Send + Sync,
{
    fn on_pair(&self, first: PoolEntry<P>, second: PoolEntry<P>) {
        self(first, second)
    }
}

/// Pair handler that discards pairs
pub struct NoOpPairHandler;

impl<P> PairHandler<P> for NoOpPairHandler {
    fn on_pair(&self, _first: PoolEntry<P>, _second: PoolEntry<P>) {}
}

/// Pair handler that logs each pair
pub struct LoggingPairHandler;

impl<P: Debug> PairHandler<P> for LoggingPairHandler {
    fn on_pair(&self, first: PoolEntry<P>, second: PoolEntry<P>) {
        tracing::info!(
            first = %first.id,
            second = %second.id,
            "pair formed: {:?} vs {:?}",
            first.payload,
            second.payload
        );
    }
}
