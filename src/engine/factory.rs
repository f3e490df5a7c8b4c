// ============================================================================
// Runner Factory
// Creates run loops with proper configuration
// ============================================================================

use crate::domain::{PlayerProfile, RatingPolicyConfig};
use crate::engine::{FixedInterval, PairingEngine, RatingPolicy, Runner};
use crate::error::{MatchmakingError, MatchmakingResult};
use crate::interfaces::{
    EventHandler, IntervalPolicy, MatchingPolicy, NoOpEventHandler, NoOpPairHandler, PairHandler,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Default delay between attempts when no interval policy is supplied
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a rating-based runner from configuration
///
/// # Arguments
/// * `config` - Rating policy configuration
/// * `pair_handler` - Receives every formed pair
///
/// # Returns
/// * `MatchmakingResult<Runner<..>>` - Configured, stopped runner or error
///
/// # Example
/// ```
/// use matchmaking_engine::prelude::*;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runner = create_from_config(RatingPolicyConfig::ranked(), NoOpPairHandler).unwrap();
/// assert!(!runner.is_running());
/// # }
/// ```
pub fn create_from_config(
    config: RatingPolicyConfig,
    pair_handler: impl PairHandler<PlayerProfile> + 'static,
) -> MatchmakingResult<Runner<PlayerProfile, RatingPolicy>> {
    RunnerBuilder::rating(config)?
        .on_pair(pair_handler)
        .build()
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating runners with fluent API
///
/// # Example
/// ```
/// use matchmaking_engine::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runner = RunnerBuilder::rating(RatingPolicyConfig::tournament())
///     .unwrap()
///     .with_interval(LinearBackoff {
///         initial: Duration::from_millis(250),
///         step: Duration::from_millis(10),
///         max: Duration::from_secs(2),
///     })
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build()
///     .unwrap();
///
/// runner.join(PlayerProfile::new("alice", 1500.0));
/// assert!(runner.is_running());
/// # }
/// ```
pub struct RunnerBuilder<P, S> {
    policy: S,
    pair_handler: Box<dyn PairHandler<P>>,
    interval: Box<dyn IntervalPolicy>,
    event_handler: Arc<dyn EventHandler>,
    runtime: Option<Handle>,
}

impl<P, S> RunnerBuilder<P, S>
where
    P: Clone + Send + 'static,
    S: MatchingPolicy<P> + 'static,
{
    /// Create a new builder around a policy
    pub fn new(policy: S) -> Self {
        Self {
            policy,
            pair_handler: Box::new(NoOpPairHandler),
            interval: Box::new(FixedInterval(DEFAULT_TICK_INTERVAL)),
            event_handler: Arc::new(NoOpEventHandler),
            runtime: None,
        }
    }

    /// Set the pair-formed callback
    pub fn on_pair(mut self, handler: impl PairHandler<P> + 'static) -> Self {
        self.pair_handler = Box::new(handler);
        self
    }

    /// Set the interval function
    pub fn with_interval(mut self, interval: impl IntervalPolicy + 'static) -> Self {
        self.interval = Box::new(interval);
        self
    }

    /// Set a fixed delay between attempts
    pub fn with_fixed_interval(self, delay: Duration) -> Self {
        self.with_interval(FixedInterval(delay))
    }

    /// Set the lifecycle event handler
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = handler;
        self
    }

    /// Run ticks on a specific runtime instead of the current one
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Get the policy without building (for inspection)
    pub fn policy(&self) -> &S {
        &self.policy
    }

    /// Build the runner (stopped until the first join or start)
    pub fn build(self) -> MatchmakingResult<Runner<P, S>> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| MatchmakingError::NoRuntime)?,
        };

        tracing::debug!(policy = self.policy.name(), "building matchmaking runner");

        Ok(Runner::with_parts(
            PairingEngine::new(self.policy),
            self.pair_handler,
            self.interval,
            self.event_handler,
            runtime,
        ))
    }
}

impl RunnerBuilder<PlayerProfile, RatingPolicy> {
    /// Builder for the rating policy; fails on invalid configuration
    pub fn rating(config: RatingPolicyConfig) -> MatchmakingResult<Self> {
        Ok(Self::new(RatingPolicy::new(config)?))
    }

    // ========================================================================
    // Preset Configurations
    // ========================================================================

    /// Apply casual-queue configuration
    pub fn casual() -> MatchmakingResult<Self> {
        Self::rating(RatingPolicyConfig::casual())
    }

    /// Apply ranked-queue configuration
    pub fn ranked() -> MatchmakingResult<Self> {
        Self::rating(RatingPolicyConfig::ranked())
    }

    /// Apply tournament configuration
    pub fn tournament() -> MatchmakingResult<Self> {
        Self::rating(RatingPolicyConfig::tournament())
    }
}
