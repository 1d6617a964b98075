//! Default values for every field of [`Parameters`][crate::Parameters].

use std::time::Duration;

/// Elo assigned to a freshly created rating.
pub const DEFAULT_BASE_ELO: f64 = 1000.0;

/// Elo gap at which the stronger side has [`DEFAULT_DELTA_ODDS`] odds of winning.
pub const DEFAULT_DELTA: f64 = 100.0;

/// Odds realized at a [`DEFAULT_DELTA`] elo gap: 100 points more means twice the chance to win.
pub const DEFAULT_DELTA_ODDS: f64 = 2.0;

/// Reward for a win against an opponent of the same elo when both k-factors are equal.
pub const DEFAULT_BASE_REWARD: f64 = 10.0;

/// By default no history is kept, which makes a rating a plain running sum of rewards.
pub const DEFAULT_HISTORY_SIZE: usize = 0;

/// Upper bound of the adaptive k-factor.
pub const DEFAULT_K_MAX: f64 = 10.0;

/// 90 days.
/// Games older than this start to weigh less and less in a rating's confidence.
pub const DEFAULT_CONFIDENCE_TIME: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Floor mixed into the game confidence so that brand new ratings still learn something.
pub const DEFAULT_CONFIDENCE_BIAS: f64 = 0.2;

/// Number of passes [`Rating::retro_elo`][crate::Rating::retro_elo] performs.
pub const DEFAULT_RETRO_ELO_ITERATIONS: u32 = 3;
