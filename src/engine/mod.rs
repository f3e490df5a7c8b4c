// ============================================================================
// Engine Module
// Contains the pairing engine, reference policy and run loop
// ============================================================================

mod interval;
mod pairing_engine;
mod rating_policy;
mod runner;

pub mod factory;

pub use factory::{create_from_config, RunnerBuilder, DEFAULT_TICK_INTERVAL};
pub use interval::{Accelerating, FixedInterval, LinearBackoff};
pub use pairing_engine::PairingEngine;
pub use rating_policy::{RatingBucket, RatingPolicy, ScoreBreakdown, StreakClass};
pub use runner::Runner;
