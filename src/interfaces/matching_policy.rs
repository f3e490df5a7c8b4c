// ============================================================================
// Matching Policy Interface
// Defines the contract for pluggable compatibility policies
// ============================================================================

use crate::domain::Participant;
use std::cmp::Ordering;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Strategy pattern interface for matchmaking policies
/// Implementations: RatingPolicy (rating/tolerance based)
///
/// The pairing engine never looks inside a payload; everything it needs to
/// know about one comes through this trait. Policies hold no per-participant
/// state: anything that has to survive between attempts lives on the payload.
///
/// All methods are expected to be total. A panicking policy aborts the
/// attempt in progress.
pub trait MatchingPolicy<P>: Send + Sync {
    /// Key grouping likely-compatible participants
    type BucketKey: Hash + Eq + Clone;

    /// Total order used to sort the pool before each attempt.
    /// Ties keep join order.
    fn compare(&self, a: &Participant<P>, b: &Participant<P>) -> Ordering;

    /// Bucket a participant belongs to for the within-bucket pass
    fn bucket_key(&self, participant: &Participant<P>) -> Self::BucketKey;

    /// Whether two distinct participants may be paired at `now`
    fn is_compatible(&self, a: &Participant<P>, b: &Participant<P>, now: Instant) -> bool;

    /// Forward window of the cross-bucket pass
    fn cross_bucket_search_limit(&self) -> usize;

    /// Whether two payloads describe the same participant (join deduplication)
    fn same_payload(&self, a: &P, b: &P) -> bool;

    /// Update a payload after an attempt left it unmatched.
    ///
    /// Default: leave the payload unchanged.
    fn evolve(&self, _payload: &mut P, _waited: Duration) {}

    /// Get the policy name for logging/metrics
    fn name(&self) -> &str;
}
