// ============================================================================
// Pairing Domain Model
// Results of a pairing attempt and engine state snapshots
// ============================================================================

use std::time::Duration;

use super::{ParticipantId, PoolEntry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Two participants matched in one attempt, removed from the pool.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchedPair<P> {
    /// Participant that was scanning when the match was found
    pub first: PoolEntry<P>,
    /// The first compatible candidate found ahead of it
    pub second: PoolEntry<P>,
}

impl<P> MatchedPair<P> {
    pub fn ids(&self) -> (ParticipantId, ParticipantId) {
        (self.first.id, self.second.id)
    }

    pub fn contains(&self, id: ParticipantId) -> bool {
        self.first.id == id || self.second.id == id
    }

    pub fn into_payloads(self) -> (P, P) {
        (self.first.payload, self.second.payload)
    }
}

/// Output of one pairing attempt.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairingOutcome<P> {
    /// Pairs formed in this attempt, in formation order
    pub pairs: Vec<MatchedPair<P>>,
    /// Participants still waiting, with payloads already evolved
    pub remaining: Vec<PoolEntry<P>>,
}

impl<P> PairingOutcome<P> {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.remaining.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.pairs.len() * 2
    }
}

impl<P> Default for PairingOutcome<P> {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            remaining: Vec::new(),
        }
    }
}

/// Point-in-time view of the engine, handed to interval policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineSnapshot {
    /// Participants currently waiting
    pub waiting: usize,
    /// Longest current wait, if anyone is waiting
    pub oldest_wait: Option<Duration>,
    /// Pairing attempts performed so far
    pub attempts: u64,
    /// Pairs formed over the engine's lifetime
    pub pairs_formed: u64,
}

impl EngineSnapshot {
    pub fn is_empty(&self) -> bool {
        self.waiting == 0
    }
}
