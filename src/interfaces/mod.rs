// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod event_handler;
mod interval_policy;
mod matching_policy;
mod pair_handler;

pub use event_handler::{EventHandler, LoggingEventHandler, MatchmakingEvent, NoOpEventHandler};
pub use interval_policy::IntervalPolicy;
pub use matching_policy::MatchingPolicy;
pub use pair_handler::{LoggingPairHandler, NoOpPairHandler, PairHandler};
