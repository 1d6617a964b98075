use thiserror::Error;

/// Reasons a set of [`Parameters`][crate::Parameters] is rejected by
/// [`Manager::new`][crate::Manager::new].
///
/// Every formula of the crate assumes these invariants, so they are checked once up front.
#[derive(Error, Clone, Copy, PartialEq, Debug)]
pub enum ConfigError {
    #[error("base_elo must be finite, got {0}")]
    NonFiniteBaseElo(f64),
    #[error("delta must be finite and > 0, got {0}")]
    InvalidDelta(f64),
    #[error("delta_odds must be finite and > 0, got {0}")]
    InvalidDeltaOdds(f64),
    /// `delta_odds == 1` makes every elo gap mean even odds, and the odds cannot be inverted.
    #[error("delta_odds must not be 1")]
    FlatDeltaOdds,
    #[error("base_reward must be finite and > 0, got {0}")]
    InvalidBaseReward(f64),
    #[error("k_max must be finite and > 1, got {0}")]
    InvalidKMax(f64),
    #[error("confidence_time must be > 0")]
    ZeroConfidenceTime,
    #[error("confidence_bias must be within [0, 1], got {0}")]
    InvalidConfidenceBias(f64),
}
