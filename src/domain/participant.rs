// ============================================================================
// Participant Domain Model
// ============================================================================

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Pool-scoped participant identifier.
///
/// Issued by the pairing engine in strictly increasing order and never reused
/// within one engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParticipantId(u64);

impl ParticipantId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Participant Entity
// ============================================================================

/// An entry in the waiting pool.
///
/// The payload is opaque to the engine; only the matching policy looks
/// inside it. The tried-set records every peer this participant has already
/// been evaluated against during the current attempt.
#[derive(Debug, Clone)]
pub struct Participant<P> {
    id: ParticipantId,
    payload: P,
    joined_at: Instant,
    tried: HashSet<ParticipantId>,
}

impl<P> Participant<P> {
    pub(crate) fn new(id: ParticipantId, payload: P, joined_at: Instant) -> Self {
        Self {
            id,
            payload,
            joined_at,
            tried: HashSet::new(),
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    pub fn joined_at(&self) -> Instant {
        self.joined_at
    }

    /// Time spent waiting as of `now` (zero if `now` precedes the join).
    pub fn wait_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.joined_at)
    }

    pub fn has_tried(&self, other: ParticipantId) -> bool {
        self.tried.contains(&other)
    }

    pub(crate) fn mark_tried(&mut self, other: ParticipantId) {
        self.tried.insert(other);
    }

    pub(crate) fn reset_tried(&mut self) {
        self.tried.clear();
    }

    pub(crate) fn into_entry(self, now: Instant) -> PoolEntry<P> {
        PoolEntry {
            id: self.id,
            waited: self.wait_time(now),
            payload: self.payload,
        }
    }
}

/// A participant as reported outside the engine: id, payload and the wait
/// accumulated at the time of the report.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolEntry<P> {
    pub id: ParticipantId,
    pub payload: P,
    pub waited: Duration,
}
