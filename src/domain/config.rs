// ============================================================================
// Rating Policy Configuration
// Weights, tolerance growth and performance tuning for the reference policy
// ============================================================================

use crate::error::{MatchmakingError, MatchmakingResult};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Matching Weights
// ============================================================================

/// Weight of each sub-score in the compatibility total.
///
/// Sub-scores are normalized to `0..=100`, so weights summing to 1.0 keep the
/// total on the same scale as `min_score`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchingWeights {
    /// Rating proximity
    pub rating: f64,
    /// Recent win-rate proximity
    pub performance: f64,
    /// Streak proximity
    pub streak: f64,
    /// Both or neither player in a promotion/demotion match
    pub stakes: f64,
}

impl Default for MatchingWeights {
    fn default() -> Self {
        Self {
            rating: 0.4,
            performance: 0.2,
            streak: 0.2,
            stakes: 0.2,
        }
    }
}

impl MatchingWeights {
    pub fn total(&self) -> f64 {
        self.rating + self.performance + self.streak + self.stakes
    }
}

// ============================================================================
// Tolerance Growth
// ============================================================================

/// Per-player rating tolerance as a function of wait time.
///
/// ```text
/// tolerance
///   max |            ___________
///       |          /
///       |        /  growth_per_second
///   min |_______/
///       +-------+-----------------> wait
///             grace
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToleranceConfig {
    pub min_tolerance: f64,
    pub max_tolerance: f64,
    /// Wait before tolerance starts growing
    pub grace_period: Duration,
    /// Rating points added per second once the grace period is over
    pub growth_per_second: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            min_tolerance: 100.0,
            max_tolerance: 500.0,
            grace_period: Duration::from_secs(10),
            growth_per_second: 10.0,
        }
    }
}

impl ToleranceConfig {
    /// Tolerance for a player who has waited `waited`.
    pub fn tolerance_after(&self, waited: Duration) -> f64 {
        if waited <= self.grace_period {
            return self.min_tolerance;
        }

        let growing_for = (waited - self.grace_period).as_secs_f64();
        (self.min_tolerance + growing_for * self.growth_per_second).min(self.max_tolerance)
    }
}

// ============================================================================
// Performance Tuning
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerformanceConfig {
    /// Width of one rating band in the bucket key
    pub bucket_size: f64,
    /// Forward window of the cross-bucket pass
    pub cross_bucket_search_limit: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            bucket_size: 200.0,
            cross_bucket_search_limit: 10,
        }
    }
}

// ============================================================================
// Streak Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StreakConfig {
    /// Consecutive wins to count as hot
    pub hot_threshold: i32,
    /// Consecutive losses to count as cold
    pub cold_threshold: i32,
    /// Streak difference at which the streak sub-score reaches zero
    pub span: i32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            hot_threshold: 3,
            cold_threshold: 3,
            span: 10,
        }
    }
}

// ============================================================================
// Complete Policy Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RatingPolicyConfig {
    pub weights: MatchingWeights,
    pub tolerance: ToleranceConfig,
    pub performance: PerformanceConfig,
    pub streak: StreakConfig,
    /// Minimum weighted score for a pair to be compatible
    pub min_score: f64,
}

impl Default for RatingPolicyConfig {
    fn default() -> Self {
        Self {
            weights: MatchingWeights::default(),
            tolerance: ToleranceConfig::default(),
            performance: PerformanceConfig::default(),
            streak: StreakConfig::default(),
            min_score: 60.0,
        }
    }
}

impl RatingPolicyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: Set matching weights
    pub fn with_weights(mut self, weights: MatchingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Builder method: Set tolerance growth
    pub fn with_tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder method: Set bucket size and cross-bucket window
    pub fn with_performance(mut self, performance: PerformanceConfig) -> Self {
        self.performance = performance;
        self
    }

    /// Builder method: Set streak classification
    pub fn with_streak(mut self, streak: StreakConfig) -> Self {
        self.streak = streak;
        self
    }

    /// Builder method: Set minimum compatibility score
    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> MatchmakingResult<()> {
        let weights = [
            ("rating", self.weights.rating),
            ("performance", self.weights.performance),
            ("streak", self.weights.streak),
            ("stakes", self.weights.stakes),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!("{name} weight must be a non-negative number")));
            }
        }
        if self.weights.total() <= 0.0 {
            return Err(invalid("at least one weight must be positive"));
        }

        let tolerance = &self.tolerance;
        if !tolerance.min_tolerance.is_finite() || tolerance.min_tolerance < 0.0 {
            return Err(invalid("minimum tolerance cannot be negative"));
        }
        if !tolerance.max_tolerance.is_finite() || tolerance.max_tolerance < tolerance.min_tolerance
        {
            return Err(invalid("maximum tolerance must be at least the minimum"));
        }
        if !tolerance.growth_per_second.is_finite() || tolerance.growth_per_second < 0.0 {
            return Err(invalid("tolerance growth cannot be negative"));
        }

        if !self.performance.bucket_size.is_finite() || self.performance.bucket_size <= 0.0 {
            return Err(invalid("bucket size must be positive"));
        }

        if self.streak.hot_threshold <= 0 || self.streak.cold_threshold <= 0 {
            return Err(invalid("streak thresholds must be positive"));
        }
        if self.streak.span <= 0 {
            return Err(invalid("streak span must be positive"));
        }

        if !self.min_score.is_finite() || self.min_score < 0.0 {
            return Err(invalid("minimum score cannot be negative"));
        }

        Ok(())
    }

    /// Parse a configuration from JSON and validate it.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> MatchmakingResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MatchmakingError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(reason: impl Into<String>) -> MatchmakingError {
    MatchmakingError::InvalidConfig(reason.into())
}

// ============================================================================
// Preset Configurations (Factory Methods)
// ============================================================================

impl RatingPolicyConfig {
    /// Casual queue
    /// - Wide tolerance that opens up quickly
    /// - Rating matters less than short queue times
    pub fn casual() -> Self {
        Self::new()
            .with_weights(MatchingWeights {
                rating: 0.3,
                performance: 0.2,
                streak: 0.2,
                stakes: 0.3,
            })
            .with_tolerance(ToleranceConfig {
                min_tolerance: 200.0,
                max_tolerance: 800.0,
                grace_period: Duration::from_secs(5),
                growth_per_second: 20.0,
            })
            .with_min_score(50.0)
    }

    /// Ranked queue (the defaults)
    pub fn ranked() -> Self {
        Self::new()
    }

    /// Tournament queue
    /// - Tight tolerance with slow growth
    /// - Rating dominates the score
    pub fn tournament() -> Self {
        Self::new()
            .with_weights(MatchingWeights {
                rating: 0.6,
                performance: 0.15,
                streak: 0.1,
                stakes: 0.15,
            })
            .with_tolerance(ToleranceConfig {
                min_tolerance: 50.0,
                max_tolerance: 250.0,
                grace_period: Duration::from_secs(30),
                growth_per_second: 2.0,
            })
            .with_performance(PerformanceConfig {
                bucket_size: 100.0,
                cross_bucket_search_limit: 5,
            })
            .with_min_score(75.0)
    }
}
