// ============================================================================
// Player Profile
// Reference payload consumed by the rating-based policy
// ============================================================================

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Matchmaking view of a player.
///
/// Equality for join deduplication is by `player_id` only; two profiles for
/// the same player with different ratings are still the same participant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlayerProfile {
    pub player_id: String,
    /// Skill rating (Elo-like scale)
    pub rating: f64,
    /// Recent win rate in `[0, 1]`
    pub recent_performance: f64,
    /// Positive for consecutive wins, negative for consecutive losses
    pub streak: i32,
    /// Whether the next match decides a promotion or demotion
    pub high_stakes: bool,
}

impl PlayerProfile {
    /// Profile with neutral performance, no streak and normal stakes.
    pub fn new(player_id: impl Into<String>, rating: f64) -> Self {
        Self {
            player_id: player_id.into(),
            rating,
            recent_performance: 0.5,
            streak: 0,
            high_stakes: false,
        }
    }

    pub fn with_performance(mut self, recent_performance: f64) -> Self {
        self.recent_performance = recent_performance.clamp(0.0, 1.0);
        self
    }

    pub fn with_streak(mut self, streak: i32) -> Self {
        self.streak = streak;
        self
    }

    pub fn with_high_stakes(mut self, high_stakes: bool) -> Self {
        self.high_stakes = high_stakes;
        self
    }
}
