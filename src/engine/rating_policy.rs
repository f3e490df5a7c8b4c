// ============================================================================
// Rating Policy
// Reference matchmaking policy: weighted compatibility with wait-time tolerance
// ============================================================================

use crate::domain::{Participant, PlayerProfile, RatingPolicyConfig};
use crate::error::MatchmakingResult;
use crate::interfaces::MatchingPolicy;
use std::cmp::Ordering;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Streak classification used in the bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StreakClass {
    Hot,
    Cold,
    Neutral,
}

/// Bucket key: rating band, stakes flag and streak class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RatingBucket {
    pub band: i64,
    pub high_stakes: bool,
    pub streak: StreakClass,
}

/// Per-signal breakdown of a compatibility evaluation.
///
/// Sub-scores are unweighted (`0..=100`); `total` is the weighted sum, or
/// zero when the rating gap is out of range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreBreakdown {
    pub rating_gap: f64,
    /// Sum of both players' current tolerances
    pub allowed_gap: f64,
    pub rating: f64,
    pub performance: f64,
    pub streak: f64,
    pub stakes: f64,
    pub total: f64,
    pub passed: bool,
}

impl ScoreBreakdown {
    pub fn is_out_of_range(&self) -> bool {
        self.rating_gap > self.allowed_gap
    }
}

/// Rating-based matchmaking
///
/// Two players are compatible when the weighted sum of four signals reaches
/// the configured minimum. The rating gap is a hard limit: a gap wider than
/// the sum of both players' tolerances scores zero, however well the other
/// signals line up.
///
/// # Example
/// ```text
/// tolerances: 100 + 100 = 200, gap 1000 vs 1050 = 50
/// rating      100 * (1 - 50/200) = 75   x 0.4 = 30
/// performance 100                       x 0.2 = 20
/// streak      100                       x 0.2 = 20
/// stakes      100                       x 0.2 = 20
/// total       90 >= 60 -> compatible
/// ```
///
/// Tolerance is derived from wait time when a pair is evaluated, so the
/// payload is never rewritten between attempts.
#[derive(Debug, Clone, Default)]
pub struct RatingPolicy {
    config: RatingPolicyConfig,
}

impl RatingPolicy {
    /// Create a policy from a validated configuration
    pub fn new(config: RatingPolicyConfig) -> MatchmakingResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingPolicyConfig {
        &self.config
    }

    /// Current tolerance of a participant
    pub fn tolerance(&self, participant: &Participant<PlayerProfile>, now: Instant) -> f64 {
        self.config
            .tolerance
            .tolerance_after(participant.wait_time(now))
    }

    /// Score a pair without side effects
    pub fn score_breakdown(
        &self,
        a: &Participant<PlayerProfile>,
        b: &Participant<PlayerProfile>,
        now: Instant,
    ) -> ScoreBreakdown {
        self.score_profiles(
            a.payload(),
            b.payload(),
            a.wait_time(now),
            b.wait_time(now),
        )
    }

    /// Score two profiles given how long each has waited
    pub fn score_profiles(
        &self,
        a: &PlayerProfile,
        b: &PlayerProfile,
        waited_a: Duration,
        waited_b: Duration,
    ) -> ScoreBreakdown {
        let tolerance = &self.config.tolerance;
        let weights = &self.config.weights;

        let rating_gap = (a.rating - b.rating).abs();
        let allowed_gap = tolerance.tolerance_after(waited_a) + tolerance.tolerance_after(waited_b);
        let out_of_range = rating_gap > allowed_gap;

        let rating = if out_of_range {
            0.0
        } else if allowed_gap <= 0.0 {
            // Zero tolerance still admits identical ratings
            100.0
        } else {
            100.0 * (1.0 - rating_gap / allowed_gap)
        };

        let performance =
            100.0 * (1.0 - (a.recent_performance - b.recent_performance).abs()).clamp(0.0, 1.0);

        let span = f64::from(self.config.streak.span);
        let streak_gap = f64::from(a.streak.abs_diff(b.streak)).min(span);
        let streak = 100.0 * (1.0 - streak_gap / span);

        let stakes = if a.high_stakes == b.high_stakes {
            100.0
        } else {
            0.0
        };

        let total = if out_of_range {
            0.0
        } else {
            rating * weights.rating
                + performance * weights.performance
                + streak * weights.streak
                + stakes * weights.stakes
        };

        ScoreBreakdown {
            rating_gap,
            allowed_gap,
            rating,
            performance,
            streak,
            stakes,
            total,
            passed: !out_of_range && total >= self.config.min_score,
        }
    }

    pub fn classify_streak(&self, streak: i32) -> StreakClass {
        if streak >= self.config.streak.hot_threshold {
            StreakClass::Hot
        } else if streak <= -self.config.streak.cold_threshold {
            StreakClass::Cold
        } else {
            StreakClass::Neutral
        }
    }
}

impl MatchingPolicy<PlayerProfile> for RatingPolicy {
    type BucketKey = RatingBucket;

    fn compare(
        &self,
        a: &Participant<PlayerProfile>,
        b: &Participant<PlayerProfile>,
    ) -> Ordering {
        a.payload().rating.total_cmp(&b.payload().rating)
    }

    fn bucket_key(&self, participant: &Participant<PlayerProfile>) -> RatingBucket {
        let profile = participant.payload();
        RatingBucket {
            band: (profile.rating / self.config.performance.bucket_size).floor() as i64,
            high_stakes: profile.high_stakes,
            streak: self.classify_streak(profile.streak),
        }
    }

    fn is_compatible(
        &self,
        a: &Participant<PlayerProfile>,
        b: &Participant<PlayerProfile>,
        now: Instant,
    ) -> bool {
        self.score_breakdown(a, b, now).passed
    }

    fn cross_bucket_search_limit(&self) -> usize {
        self.config.performance.cross_bucket_search_limit
    }

    fn same_payload(&self, a: &PlayerProfile, b: &PlayerProfile) -> bool {
        a.player_id == b.player_id
    }

    fn name(&self) -> &str {
        "Rating"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ParticipantId, ToleranceConfig};
    use crate::engine::PairingEngine;

    fn participant(id: u64, profile: PlayerProfile, joined_at: Instant) -> Participant<PlayerProfile> {
        Participant::new(ParticipantId::from_raw(id), profile, joined_at)
    }

    #[test]
    fn test_close_ratings_score() {
        let policy = RatingPolicy::default();
        let now = Instant::now();
        let a = participant(1, PlayerProfile::new("a", 1000.0), now);
        let b = participant(2, PlayerProfile::new("b", 1050.0), now);

        let score = policy.score_breakdown(&a, &b, now);

        assert_eq!(score.allowed_gap, 200.0);
        assert!((score.rating - 75.0).abs() < 1e-9);
        assert_eq!(score.performance, 100.0);
        assert_eq!(score.streak, 100.0);
        assert_eq!(score.stakes, 100.0);
        assert!((score.total - 90.0).abs() < 1e-9);
        assert!(score.passed);
        assert!(policy.is_compatible(&a, &b, now));
    }

    #[test]
    fn test_out_of_range_forces_zero() {
        let policy = RatingPolicy::default();
        let now = Instant::now();
        let a = participant(1, PlayerProfile::new("a", 1000.0), now);
        let b = participant(2, PlayerProfile::new("b", 1300.0), now);

        let score = policy.score_breakdown(&a, &b, now);

        assert!(score.is_out_of_range());
        assert_eq!(score.total, 0.0);
        assert!(!score.passed);
        // Other signals are still reported
        assert_eq!(score.performance, 100.0);
    }

    #[test]
    fn test_out_of_range_fails_even_with_zero_minimum() {
        let policy = RatingPolicy::new(RatingPolicyConfig::new().with_min_score(0.0)).unwrap();
        let now = Instant::now();
        let a = participant(1, PlayerProfile::new("a", 0.0), now);
        let b = participant(2, PlayerProfile::new("b", 5000.0), now);

        assert!(!policy.is_compatible(&a, &b, now));
    }

    #[test]
    fn test_signals_can_fail_in_range_pair() {
        let policy = RatingPolicy::default();
        let now = Instant::now();
        let a = participant(
            1,
            PlayerProfile::new("a", 1000.0)
                .with_performance(0.0)
                .with_streak(-10)
                .with_high_stakes(true),
            now,
        );
        let b = participant(
            2,
            PlayerProfile::new("b", 1100.0)
                .with_performance(1.0)
                .with_streak(10),
            now,
        );

        let score = policy.score_breakdown(&a, &b, now);

        // rating 50 * 0.4 = 20, all other signals zero
        assert!(!score.is_out_of_range());
        assert!((score.total - 20.0).abs() < 1e-9);
        assert!(!score.passed);
    }

    #[test]
    fn test_tolerance_grows_with_wait() {
        let policy = RatingPolicy::default();
        let start = Instant::now();
        let a = participant(1, PlayerProfile::new("a", 1000.0), start);
        let b = participant(2, PlayerProfile::new("b", 1300.0), start);

        assert!(!policy.is_compatible(&a, &b, start));
        // 25 s in: each tolerance is 100 + 15 * 10 = 250, allowed gap 500
        let later = start + Duration::from_secs(25);
        assert_eq!(policy.tolerance(&a, later), 250.0);
        assert!(policy.is_compatible(&a, &b, later));
    }

    #[test]
    fn test_score_monotonic_in_wait_time() {
        let policy = RatingPolicy::new(RatingPolicyConfig::new().with_tolerance(ToleranceConfig {
            min_tolerance: 50.0,
            max_tolerance: 400.0,
            grace_period: Duration::from_secs(2),
            growth_per_second: 7.5,
        }))
        .unwrap();
        let start = Instant::now();
        let a = participant(1, PlayerProfile::new("a", 1000.0), start);
        let b = participant(2, PlayerProfile::new("b", 1420.0).with_streak(4), start);

        let mut previous = policy.score_breakdown(&a, &b, start);
        let mut was_compatible = previous.passed;
        for secs in 1..120 {
            let score = policy.score_breakdown(&a, &b, start + Duration::from_secs(secs));
            assert!(score.total >= previous.total);
            assert!(score.passed || !was_compatible);
            was_compatible = score.passed;
            previous = score;
        }
    }

    #[test]
    fn test_bucket_key() {
        let policy = RatingPolicy::default();
        let now = Instant::now();

        let hot = participant(1, PlayerProfile::new("a", 1250.0).with_streak(5), now);
        let key = policy.bucket_key(&hot);
        assert_eq!(
            key,
            RatingBucket {
                band: 6,
                high_stakes: false,
                streak: StreakClass::Hot,
            }
        );

        let cold = participant(2, PlayerProfile::new("b", 1399.0).with_streak(-3), now);
        assert_eq!(policy.bucket_key(&cold).streak, StreakClass::Cold);
        assert_eq!(policy.bucket_key(&cold).band, 6);

        let stakes = participant(3, PlayerProfile::new("c", 1000.0).with_high_stakes(true), now);
        assert!(policy.bucket_key(&stakes).high_stakes);
        assert_eq!(policy.classify_streak(2), StreakClass::Neutral);
    }

    #[test]
    fn test_same_payload_by_player_id() {
        let policy = RatingPolicy::default();
        assert!(policy.same_payload(
            &PlayerProfile::new("a", 1000.0),
            &PlayerProfile::new("a", 1800.0)
        ));
        assert!(!policy.same_payload(
            &PlayerProfile::new("a", 1000.0),
            &PlayerProfile::new("b", 1000.0)
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RatingPolicyConfig::new().with_min_score(-1.0);
        assert!(RatingPolicy::new(config).is_err());
    }

    #[test]
    fn test_engine_scenarios() {
        let start = Instant::now();

        // Same bucket, close ratings: one pair
        let mut engine = PairingEngine::new(RatingPolicy::default());
        engine.join_at(PlayerProfile::new("a", 1000.0), start);
        engine.join_at(PlayerProfile::new("b", 1050.0), start);
        let outcome = engine.make_pairs_at(start);
        assert_eq!(outcome.pairs.len(), 1);
        assert!(outcome.remaining.is_empty());

        // Gap beyond both minimum tolerances: nobody pairs
        let mut engine = PairingEngine::new(RatingPolicy::default());
        engine.join_at(PlayerProfile::new("a", 1000.0), start);
        engine.join_at(PlayerProfile::new("b", 1400.0), start);
        let outcome = engine.make_pairs_at(start);
        assert!(outcome.pairs.is_empty());
        assert_eq!(outcome.remaining.len(), 2);

        // ...until tolerance has grown enough
        let outcome = engine.make_pairs_at(start + Duration::from_secs(30));
        assert_eq!(outcome.pairs.len(), 1);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_three_compatible_players_one_pair_per_tick() {
        let start = Instant::now();
        let mut engine = PairingEngine::new(RatingPolicy::default());
        engine.join_at(PlayerProfile::new("a", 1010.0), start);
        engine.join_at(PlayerProfile::new("b", 1020.0), start);
        engine.join_at(PlayerProfile::new("c", 1030.0), start);

        let outcome = engine.make_pairs_at(start);
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.remaining.len(), 1);

        let outcome = engine.make_pairs_at(start + Duration::from_secs(1));
        assert!(outcome.pairs.is_empty());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_cross_bucket_pairing() {
        // 1190 and 1210 straddle a band boundary
        let start = Instant::now();
        let mut engine = PairingEngine::new(RatingPolicy::default());
        engine.join_at(PlayerProfile::new("a", 1190.0), start);
        engine.join_at(PlayerProfile::new("b", 1210.0), start);

        let outcome = engine.make_pairs_at(start);
        assert_eq!(outcome.pairs.len(), 1);
    }
}
