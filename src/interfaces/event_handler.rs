// ============================================================================
// Event Handler Interface
// Defines the contract for handling matchmaking lifecycle events
// ============================================================================

use crate::domain::ParticipantId;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the run loop
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatchmakingEvent {
    /// Participant admitted to the pool
    ParticipantJoined {
        participant_id: ParticipantId,
        timestamp: DateTime<Utc>,
    },

    /// Join ignored because an equal payload is already waiting
    JoinRejected { timestamp: DateTime<Utc> },

    /// Participant removed by an explicit leave
    ParticipantLeft {
        participant_id: ParticipantId,
        timestamp: DateTime<Utc>,
    },

    /// Two participants matched and handed to the pair handler
    PairFormed {
        match_id: Uuid,
        first: ParticipantId,
        second: ParticipantId,
        timestamp: DateTime<Utc>,
    },

    /// One pairing attempt finished
    AttemptCompleted {
        pairs: usize,
        remaining: usize,
        timestamp: DateTime<Utc>,
    },

    /// Run loop became active
    RunnerStarted { timestamp: DateTime<Utc> },

    /// Run loop became idle
    RunnerStopped {
        elapsed: Duration,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing run loop events
/// Implementations can handle logging, metrics, notifications, etc.
pub trait EventHandler: Send + Sync {
    /// Handle a matchmaking event
    fn on_event(&self, event: MatchmakingEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<MatchmakingEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: MatchmakingEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: MatchmakingEvent) {
        tracing::debug!("Matchmaking event: {:?}", event);
    }
}
