// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod config;
pub mod pairing;
pub mod participant;
pub mod player;

pub use config::{
    MatchingWeights, PerformanceConfig, RatingPolicyConfig, StreakConfig, ToleranceConfig,
};
pub use pairing::{EngineSnapshot, MatchedPair, PairingOutcome};
pub use participant::{Participant, ParticipantId, PoolEntry};
pub use player::PlayerProfile;
