// ============================================================================
// Matchmaking Engine Library
// Bucketed greedy pairing with pluggable policies and an adaptive run loop
// ============================================================================

//! # Matchmaking Engine
//!
//! Pairs waiting participants into balanced matches and keeps retrying the
//! ones left over until they are paired or leave.
//!
//! ## Features
//!
//! - **Bucketed greedy pairing**: exhaustive first-fit inside buckets, then a
//!   bounded cross-bucket pass
//! - **Pluggable policies** via [`MatchingPolicy`](interfaces::MatchingPolicy)
//!   (ordering, buckets, compatibility, payload evolution)
//! - **Rating-based reference policy** with wait-time tolerance growth
//! - **Self-managing run loop** that starts on the first join, stops when the
//!   pool empties and reschedules through a caller-supplied interval function
//!
//! ## Example
//!
//! ```rust
//! use matchmaking_engine::prelude::*;
//! use std::time::Instant;
//!
//! let mut engine = PairingEngine::new(RatingPolicy::default());
//! let now = Instant::now();
//!
//! engine.join_at(PlayerProfile::new("alice", 1000.0), now);
//! engine.join_at(PlayerProfile::new("bob", 1050.0), now);
//! engine.join_at(PlayerProfile::new("carol", 1900.0), now);
//!
//! let outcome = engine.make_pairs_at(now);
//! assert_eq!(outcome.pairs.len(), 1);
//! assert_eq!(outcome.remaining.len(), 1);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        EngineSnapshot, MatchedPair, MatchingWeights, PairingOutcome, Participant, ParticipantId,
        PerformanceConfig, PlayerProfile, PoolEntry, RatingPolicyConfig, StreakConfig,
        ToleranceConfig,
    };
    pub use crate::engine::{
        create_from_config, Accelerating, FixedInterval, LinearBackoff, PairingEngine,
        RatingBucket, RatingPolicy, Runner, RunnerBuilder, ScoreBreakdown, StreakClass,
    };
    pub use crate::error::{MatchmakingError, MatchmakingResult};
    pub use crate::interfaces::{
        EventHandler, IntervalPolicy, LoggingEventHandler, LoggingPairHandler, MatchingPolicy,
        MatchmakingEvent, NoOpEventHandler, NoOpPairHandler, PairHandler,
    };
}
