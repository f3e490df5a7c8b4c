// ============================================================================
// Pairing Engine
// Bucketed greedy first-fit pairing over a pool of waiting participants
// ============================================================================

use crate::domain::{
    EngineSnapshot, MatchedPair, PairingOutcome, Participant, ParticipantId, PoolEntry,
};
use crate::interfaces::MatchingPolicy;
use std::collections::HashMap;
use std::time::Instant;

/// Pool of waiting participants plus the policy that pairs them.
///
/// Each call to [`make_pairs`](Self::make_pairs) runs one attempt:
///
/// 1. Stable-sort the pool with the policy comparator (ties keep join order).
/// 2. Split the sorted view into buckets by policy key.
/// 3. Within each bucket, every unmatched participant takes the first later,
///    untried, compatible member (first-fit, not best-fit).
/// 4. Everyone still unmatched gets one more greedy pass across buckets, with
///    each forward scan limited to the policy's cross-bucket window.
/// 5. Survivors have their tried-sets cleared and their payloads evolved.
///
/// A pair is marked tried in both directions as soon as it is evaluated,
/// whatever the outcome, so no pair is tested twice within one attempt even
/// if it would have become compatible later in the same attempt. Retries
/// happen on the next attempt.
///
/// The engine is single-writer: callers sharing it across threads must
/// serialize access themselves.
pub struct PairingEngine<P, S> {
    policy: S,

    /// Waiting participants in join order
    pool: Vec<Participant<P>>,

    /// Next identifier to issue
    next_id: u64,

    attempts: u64,
    pairs_formed: u64,
}

impl<P, S> PairingEngine<P, S>
where
    P: Clone,
    S: MatchingPolicy<P>,
{
    pub fn new(policy: S) -> Self {
        Self {
            policy,
            pool: Vec::new(),
            next_id: 1,
            attempts: 0,
            pairs_formed: 0,
        }
    }

    /// Add a participant joining now.
    ///
    /// Returns `None` when an equal payload (per the policy) is already
    /// waiting; that is a normal outcome, not an error.
    pub fn join(&mut self, payload: P) -> Option<ParticipantId> {
        self.join_at(payload, Instant::now())
    }

    /// Add a participant with an explicit join instant.
    pub fn join_at(&mut self, payload: P, joined_at: Instant) -> Option<ParticipantId> {
        if self
            .pool
            .iter()
            .any(|p| self.policy.same_payload(p.payload(), &payload))
        {
            tracing::debug!(policy = self.policy.name(), "duplicate join ignored");
            return None;
        }

        let id = ParticipantId::from_raw(self.next_id);
        self.next_id += 1;
        self.pool.push(Participant::new(id, payload, joined_at));

        tracing::debug!(participant = %id, waiting = self.pool.len(), "participant joined");
        Some(id)
    }

    /// Remove a participant. Unknown ids are ignored.
    ///
    /// Returns whether someone was removed.
    pub fn leave(&mut self, id: ParticipantId) -> bool {
        match self.pool.iter().position(|p| p.id() == id) {
            Some(index) => {
                self.pool.remove(index);
                tracing::debug!(participant = %id, waiting = self.pool.len(), "participant left");
                true
            }
            None => false,
        }
    }

    /// Run one pairing attempt now.
    pub fn make_pairs(&mut self) -> PairingOutcome<P> {
        self.make_pairs_at(Instant::now())
    }

    /// Run one pairing attempt, evaluating wait times as of `now`.
    pub fn make_pairs_at(&mut self, now: Instant) -> PairingOutcome<P> {
        self.attempts += 1;

        if self.pool.len() < 2 {
            self.finish_unmatched(now);
            return PairingOutcome {
                pairs: Vec::new(),
                remaining: self.remaining_entries(now),
            };
        }

        // Step 1: stable sort (Vec::sort_by is stable)
        let mut sorted: Vec<usize> = (0..self.pool.len()).collect();
        sorted.sort_by(|&a, &b| self.policy.compare(&self.pool[a], &self.pool[b]));

        let mut matched = vec![false; self.pool.len()];
        let mut pairs: Vec<(usize, usize)> = Vec::new();

        // Step 2 + 3: within-bucket pass
        for bucket in self.buckets(&sorted) {
            self.greedy_pass(&bucket, None, &mut matched, &mut pairs, now);
        }
        let bucket_pairs = pairs.len();

        // Step 4: cross-bucket pass over the leftovers, in sorted order
        let leftovers: Vec<usize> = sorted.iter().copied().filter(|&i| !matched[i]).collect();
        let window = self.policy.cross_bucket_search_limit();
        self.greedy_pass(&leftovers, Some(window), &mut matched, &mut pairs, now);

        tracing::debug!(
            policy = self.policy.name(),
            pool = self.pool.len(),
            bucket_pairs,
            cross_bucket_pairs = pairs.len() - bucket_pairs,
            "pairing attempt finished"
        );

        // Step 5 + 6: pull pairs out of the pool, evolve the rest
        let mut slots: Vec<Option<Participant<P>>> =
            std::mem::take(&mut self.pool).into_iter().map(Some).collect();

        let mut formed = Vec::with_capacity(pairs.len());
        for (a, b) in pairs {
            if let (Some(first), Some(second)) = (slots[a].take(), slots[b].take()) {
                formed.push(MatchedPair {
                    first: first.into_entry(now),
                    second: second.into_entry(now),
                });
            }
        }

        self.pool = slots.into_iter().flatten().collect();
        self.pairs_formed += formed.len() as u64;
        self.finish_unmatched(now);

        PairingOutcome {
            pairs: formed,
            remaining: self.remaining_entries(now),
        }
    }

    /// Group sorted pool indices by bucket key, preserving sorted order within
    /// each bucket and first-appearance order across buckets.
    fn buckets(&self, sorted: &[usize]) -> Vec<Vec<usize>> {
        let mut index: HashMap<S::BucketKey, usize> = HashMap::new();
        let mut buckets: Vec<Vec<usize>> = Vec::new();

        for &i in sorted {
            let key = self.policy.bucket_key(&self.pool[i]);
            let slot = *index.entry(key).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(i);
        }

        buckets
    }

    /// Greedy first-fit scan over `order`.
    ///
    /// With a `window`, each participant only looks at the next `window`
    /// positions of `order`; without one, it looks at the rest of `order`.
    fn greedy_pass(
        &mut self,
        order: &[usize],
        window: Option<usize>,
        matched: &mut [bool],
        pairs: &mut Vec<(usize, usize)>,
        now: Instant,
    ) {
        for (pos, &i) in order.iter().enumerate() {
            if matched[i] {
                continue;
            }

            let ahead = &order[pos + 1..];
            let ahead = match window {
                Some(limit) => &ahead[..limit.min(ahead.len())],
                None => ahead,
            };

            for &j in ahead {
                if matched[j] {
                    continue;
                }

                let other_id = self.pool[j].id();
                if self.pool[i].has_tried(other_id) {
                    continue;
                }

                let compatible = self
                    .policy
                    .is_compatible(&self.pool[i], &self.pool[j], now);

                let own_id = self.pool[i].id();
                self.pool[i].mark_tried(other_id);
                self.pool[j].mark_tried(own_id);

                tracing::trace!(first = %own_id, second = %other_id, compatible, "pair evaluated");

                if compatible {
                    matched[i] = true;
                    matched[j] = true;
                    pairs.push((i, j));
                    break;
                }
            }
        }
    }

    fn finish_unmatched(&mut self, now: Instant) {
        for participant in &mut self.pool {
            participant.reset_tried();
            let waited = participant.wait_time(now);
            self.policy.evolve(participant.payload_mut(), waited);
        }
    }

    fn remaining_entries(&self, now: Instant) -> Vec<PoolEntry<P>> {
        self.pool
            .iter()
            .cloned()
            .map(|p| p.into_entry(now))
            .collect()
    }
}

impl<P, S> PairingEngine<P, S> {
    pub fn policy(&self) -> &S {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.pool.iter().any(|p| p.id() == id)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant<P>> {
        self.pool.iter().find(|p| p.id() == id)
    }

    /// Waiting participants in join order
    pub fn participants(&self) -> impl Iterator<Item = &Participant<P>> {
        self.pool.iter()
    }

    /// Get engine snapshot as of `now`
    pub fn snapshot_at(&self, now: Instant) -> EngineSnapshot {
        EngineSnapshot {
            waiting: self.pool.len(),
            oldest_wait: self.pool.iter().map(|p| p.wait_time(now)).max(),
            attempts: self.attempts,
            pairs_formed: self.pairs_formed,
        }
    }

    /// Get engine snapshot
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshot_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::cmp::Ordering;
    use std::collections::HashSet;
    use std::time::Duration;

    /// Test policy over `(key, value)` payloads.
    ///
    /// Sorts by value, buckets by `value / bucket_width`, and pairs two
    /// participants when their values differ by at most `max_gap`. Every
    /// evaluation is recorded.
    struct GapPolicy {
        bucket_width: u32,
        max_gap: u32,
        window: usize,
        evaluated: Mutex<Vec<(ParticipantId, ParticipantId)>>,
    }

    impl GapPolicy {
        fn new(bucket_width: u32, max_gap: u32, window: usize) -> Self {
            Self {
                bucket_width,
                max_gap,
                window,
                evaluated: Mutex::new(Vec::new()),
            }
        }
    }

    impl MatchingPolicy<(u32, u32)> for GapPolicy {
        type BucketKey = u32;

        fn compare(&self, a: &Participant<(u32, u32)>, b: &Participant<(u32, u32)>) -> Ordering {
            a.payload().1.cmp(&b.payload().1)
        }

        fn bucket_key(&self, participant: &Participant<(u32, u32)>) -> u32 {
            participant.payload().1 / self.bucket_width
        }

        fn is_compatible(
            &self,
            a: &Participant<(u32, u32)>,
            b: &Participant<(u32, u32)>,
            _now: Instant,
        ) -> bool {
            self.evaluated.lock().push((a.id(), b.id()));
            a.payload().1.abs_diff(b.payload().1) <= self.max_gap
        }

        fn cross_bucket_search_limit(&self) -> usize {
            self.window
        }

        fn same_payload(&self, a: &(u32, u32), b: &(u32, u32)) -> bool {
            a.0 == b.0
        }

        fn evolve(&self, payload: &mut (u32, u32), _waited: Duration) {
            // Drift one step so evolution is observable
            payload.1 += 1;
        }

        fn name(&self) -> &str {
            "Gap"
        }
    }

    fn engine(bucket_width: u32, max_gap: u32, window: usize) -> PairingEngine<(u32, u32), GapPolicy> {
        PairingEngine::new(GapPolicy::new(bucket_width, max_gap, window))
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut engine = engine(100, 0, 10);
        let a = engine.join((1, 10)).unwrap();
        let b = engine.join((2, 10)).unwrap();
        engine.leave(a);
        let c = engine.join((3, 10)).unwrap();

        assert!(a < b && b < c);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut engine = engine(100, 0, 10);
        assert!(engine.join((1, 10)).is_some());
        assert!(engine.join((1, 99)).is_none());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_leave_unknown_is_noop() {
        let mut engine = engine(100, 0, 10);
        engine.join((1, 10));

        assert!(!engine.leave(ParticipantId::from_raw(42)));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_empty_and_single_pool() {
        let mut engine = engine(100, 1000, 10);
        let outcome = engine.make_pairs();
        assert!(outcome.pairs.is_empty());
        assert!(outcome.remaining.is_empty());

        engine.join((1, 10));
        let outcome = engine.make_pairs();
        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.remaining.len(), 1);
        assert!(engine.policy().evaluated.lock().is_empty());
    }

    #[test]
    fn test_first_fit_within_bucket() {
        let mut engine = engine(100, 1000, 10);
        let a = engine.join((1, 10)).unwrap();
        let b = engine.join((2, 20)).unwrap();
        let c = engine.join((3, 30)).unwrap();

        let outcome = engine.make_pairs();

        // a takes the first compatible candidate ahead of it
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].ids(), (a, b));
        assert_eq!(outcome.remaining.len(), 1);
        assert_eq!(outcome.remaining[0].id, c);
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_equal_keys_keep_join_order() {
        let mut engine = engine(100, 0, 10);
        let a = engine.join((1, 50)).unwrap();
        let b = engine.join((2, 50)).unwrap();
        let c = engine.join((3, 50)).unwrap();
        let d = engine.join((4, 50)).unwrap();

        let outcome = engine.make_pairs();
        let ids: Vec<_> = outcome.pairs.iter().map(MatchedPair::ids).collect();

        assert_eq!(ids, vec![(a, b), (c, d)]);
    }

    #[test]
    fn test_sorted_order_drives_pairing() {
        // Values 30, 10, 20 sort to 10, 20, 30: the pair is (10, 20)
        let mut engine = engine(100, 15, 10);
        let high = engine.join((1, 30)).unwrap();
        let low = engine.join((2, 10)).unwrap();
        let mid = engine.join((3, 20)).unwrap();

        let outcome = engine.make_pairs();

        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].ids(), (low, mid));
        assert_eq!(outcome.remaining[0].id, high);
    }

    #[test]
    fn test_cross_bucket_fallback() {
        // 95 and 105 land in different buckets but are 10 apart
        let mut engine = engine(100, 10, 10);
        let a = engine.join((1, 95)).unwrap();
        let b = engine.join((2, 105)).unwrap();

        let outcome = engine.make_pairs();

        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].ids(), (a, b));
    }

    #[test]
    fn test_cross_bucket_window_bounds_scan() {
        // One participant per bucket, nothing compatible, window of 2
        let mut engine = engine(10, 0, 2);
        let first = engine.join((1, 5)).unwrap();
        engine.join((2, 15));
        engine.join((3, 25));
        let far = engine.join((4, 5_000)).unwrap();

        let outcome = engine.make_pairs();

        assert!(outcome.pairs.is_empty());
        let evaluated = engine.policy().evaluated.lock();
        // 5 -> {15, 25}, 15 -> {25, 5000}, 25 -> {5000}
        assert_eq!(evaluated.len(), 5);
        assert!(!evaluated.contains(&(first, far)));
    }

    #[test]
    fn test_pairs_tried_once_per_attempt() {
        let mut engine = engine(100, 0, 10);
        engine.join((1, 10));
        engine.join((2, 20));
        engine.join((3, 30));

        engine.make_pairs();

        let evaluated = engine.policy().evaluated.lock().clone();
        let unique: HashSet<(ParticipantId, ParticipantId)> = evaluated
            .iter()
            .map(|&(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        // Three incompatible participants in one bucket: exactly three pairs
        // evaluated, none twice despite the cross-bucket pass
        assert_eq!(evaluated.len(), 3);
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_tried_sets_reset_between_attempts() {
        let mut engine = engine(100, 0, 10);
        engine.join((1, 10));
        engine.join((2, 20));

        engine.make_pairs();
        engine.make_pairs();

        // Re-evaluated on the second attempt
        assert_eq!(engine.policy().evaluated.lock().len(), 2);
        for participant in engine.participants() {
            assert!(!participant.has_tried(ParticipantId::from_raw(1)));
            assert!(!participant.has_tried(ParticipantId::from_raw(2)));
        }
    }

    #[test]
    fn test_unmatched_payloads_evolve() {
        let mut engine = engine(100, 0, 10);
        let a = engine.join((1, 10)).unwrap();

        let outcome = engine.make_pairs();

        assert_eq!(outcome.remaining[0].payload, (1, 11));
        assert_eq!(engine.get(a).map(|p| *p.payload()), Some((1, 11)));
    }

    #[test]
    fn test_matched_payloads_are_originals() {
        let mut engine = engine(100, 100, 10);
        engine.join((1, 10));
        engine.join((2, 20));

        let outcome = engine.make_pairs();

        assert_eq!(outcome.pairs[0].clone().into_payloads(), ((1, 10), (2, 20)));
    }

    #[test]
    fn test_three_compatible_drain_over_ticks() {
        let mut engine = engine(100, 100, 10);
        engine.join((1, 10));
        engine.join((2, 20));
        engine.join((3, 30));

        let first = engine.make_pairs();
        assert_eq!(first.pairs.len(), 1);
        assert_eq!(first.remaining.len(), 1);

        let second = engine.make_pairs();
        assert!(second.pairs.is_empty());
        assert!(engine.len() <= 1);
    }

    #[test]
    fn test_snapshot() {
        let start = Instant::now();
        let mut engine = engine(100, 100, 10);
        engine.join_at((1, 10), start);
        engine.join_at((2, 20), start + Duration::from_secs(2));
        engine.join_at((3, 30), start + Duration::from_secs(3));

        let snapshot = engine.snapshot_at(start + Duration::from_secs(5));
        assert_eq!(snapshot.waiting, 3);
        assert_eq!(snapshot.oldest_wait, Some(Duration::from_secs(5)));
        assert_eq!(snapshot.attempts, 0);

        engine.make_pairs_at(start + Duration::from_secs(5));
        let snapshot = engine.snapshot_at(start + Duration::from_secs(5));
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.pairs_formed, 1);
        assert_eq!(snapshot.waiting, 1);
    }

    proptest! {
        #[test]
        fn prop_ids_unique_and_increasing(values in prop::collection::vec(0u32..1000, 0..50)) {
            let mut engine = engine(100, 50, 5);
            let mut last: Option<ParticipantId> = None;
            for (key, value) in values.into_iter().enumerate() {
                let id = engine.join((key as u32, value));
                prop_assert!(id.is_some());
                if let (Some(prev), Some(id)) = (last, id) {
                    prop_assert!(id > prev);
                }
                last = id;
            }
        }

        #[test]
        fn prop_pairs_and_remaining_disjoint(
            values in prop::collection::vec(0u32..2000, 0..60),
            bucket_width in 1u32..500,
            max_gap in 0u32..300,
            window in 0usize..8,
        ) {
            let mut engine = engine(bucket_width, max_gap, window);
            for (key, value) in values.iter().enumerate() {
                engine.join((key as u32, *value));
            }
            let before = engine.len();

            let outcome = engine.make_pairs();

            let mut seen = HashSet::new();
            for pair in &outcome.pairs {
                prop_assert!(seen.insert(pair.first.id));
                prop_assert!(seen.insert(pair.second.id));
                prop_assert!(pair.first.payload.1.abs_diff(pair.second.payload.1) <= max_gap);
            }
            for entry in &outcome.remaining {
                prop_assert!(seen.insert(entry.id));
            }
            prop_assert_eq!(seen.len(), before);
            prop_assert_eq!(engine.len(), outcome.remaining.len());

            for (a, b) in engine.policy().evaluated.lock().iter() {
                prop_assert_ne!(a, b);
            }
        }
    }
}
