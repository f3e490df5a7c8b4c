// ============================================================================
// Matchmaking Errors
// Failures surfaced while configuring or constructing the engine
// ============================================================================

use thiserror::Error;

/// Errors raised while building policies and runners.
///
/// Pairing itself never fails: duplicate joins and unknown leaves are
/// ordinary outcomes reported through return values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchmakingError {
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The runner was created outside a tokio runtime
    #[error("no tokio runtime available to drive the run loop")]
    NoRuntime,

    /// A serialized configuration could not be parsed
    #[cfg(feature = "serde")]
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

/// Result type alias for matchmaking setup operations
pub type MatchmakingResult<T> = Result<T, MatchmakingError>;
