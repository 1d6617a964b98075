//! This crate provides ELO-style skill ratings for two-sided, win/lose games.
//!
//! On top of the classic odds model, every [`Rating`] can keep a bounded history of its last games.
//! The published elo is then a confidence-weighted average of the recent cumulative scores,
//! which keeps a single surprising result from making the rating swing wildly.
//! A time-decayed confidence drives an adaptive k-factor:
//! newcomers and players that have been away for a long time move fast, veterans move slowly.
//!
//! The [`algorithm`] module provides the pure odds, probability and reward formulas.
//!
//! The [`Manager`] owns the [`Parameters`], creates ratings and registers games between them
//! with [`Manager::register_win`].

#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_rust_codeblocks
)]
#![forbid(unsafe_code)]

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod algorithm;
pub mod constants;
pub mod error;
pub mod manager;
pub mod rating;
pub mod util;

pub use error::ConfigError;
pub use manager::Manager;
pub use rating::{GameData, GameResult, HistoryEntry, Rating, RatingState};

/// The tunable constants of the rating model.
///
/// A [`Manager`] validates them once and shares them with every [`Rating`] it creates.
/// Use [`Parameters::default`] and the `with_*` methods to build a custom set.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Parameters {
    base_elo: f64,
    delta: f64,
    delta_odds: f64,
    base_reward: f64,
    history_size: usize,
    k_max: f64,
    confidence_time: Duration,
    confidence_bias: f64,
}

impl Parameters {
    #[must_use]
    pub fn with_base_elo(self, base_elo: f64) -> Self {
        Parameters { base_elo, ..self }
    }

    /// Sets the odds curve: an elo gap of `delta` means `delta_odds` odds for the stronger side.
    #[must_use]
    pub fn with_odds(self, delta: f64, delta_odds: f64) -> Self {
        Parameters {
            delta,
            delta_odds,
            ..self
        }
    }

    #[must_use]
    pub fn with_base_reward(self, base_reward: f64) -> Self {
        Parameters {
            base_reward,
            ..self
        }
    }

    /// A `history_size` of 0 or 1 disables history, confidence and smoothing altogether.
    #[must_use]
    pub fn with_history_size(self, history_size: usize) -> Self {
        Parameters {
            history_size,
            ..self
        }
    }

    #[must_use]
    pub fn with_k_max(self, k_max: f64) -> Self {
        Parameters { k_max, ..self }
    }

    #[must_use]
    pub fn with_confidence_time(self, confidence_time: Duration) -> Self {
        Parameters {
            confidence_time,
            ..self
        }
    }

    #[must_use]
    pub fn with_confidence_bias(self, confidence_bias: f64) -> Self {
        Parameters {
            confidence_bias,
            ..self
        }
    }

    /// Checks the invariants every formula of this crate relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_elo.is_finite() {
            return Err(ConfigError::NonFiniteBaseElo(self.base_elo));
        }
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(ConfigError::InvalidDelta(self.delta));
        }
        if !(self.delta_odds.is_finite() && self.delta_odds > 0.0) {
            return Err(ConfigError::InvalidDeltaOdds(self.delta_odds));
        }
        if (self.delta_odds - 1.0).abs() < f64::EPSILON {
            return Err(ConfigError::FlatDeltaOdds);
        }
        if !(self.base_reward.is_finite() && self.base_reward > 0.0) {
            return Err(ConfigError::InvalidBaseReward(self.base_reward));
        }
        if !(self.k_max.is_finite() && self.k_max > 1.0) {
            return Err(ConfigError::InvalidKMax(self.k_max));
        }
        if self.confidence_time.is_zero() {
            return Err(ConfigError::ZeroConfidenceTime);
        }
        if !(0.0..=1.0).contains(&self.confidence_bias) {
            return Err(ConfigError::InvalidConfidenceBias(self.confidence_bias));
        }

        Ok(())
    }

    /// Whether ratings keep a history, and therefore smooth their elo and track confidence.
    #[must_use]
    pub fn keeps_history(&self) -> bool {
        self.history_size > 1
    }

    /// Elo a new rating starts out with.
    ///
    /// See also [`constants::DEFAULT_BASE_ELO`].
    #[must_use]
    pub fn base_elo(&self) -> f64 {
        self.base_elo
    }

    /// Elo gap unit of the odds curve.
    ///
    /// See also [`constants::DEFAULT_DELTA`].
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Odds of the stronger side at a gap of exactly [`Parameters::delta`].
    ///
    /// See also [`constants::DEFAULT_DELTA_ODDS`].
    #[must_use]
    pub fn delta_odds(&self) -> f64 {
        self.delta_odds
    }

    /// See also [`constants::DEFAULT_BASE_REWARD`].
    #[must_use]
    pub fn base_reward(&self) -> f64 {
        self.base_reward
    }

    /// Number of past games each rating retains.
    ///
    /// See also [`constants::DEFAULT_HISTORY_SIZE`].
    #[must_use]
    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// See also [`constants::DEFAULT_K_MAX`].
    #[must_use]
    pub fn k_max(&self) -> f64 {
        self.k_max
    }

    /// Age after which a past game starts to count less towards confidence.
    ///
    /// See also [`constants::DEFAULT_CONFIDENCE_TIME`].
    #[must_use]
    pub fn confidence_time(&self) -> Duration {
        self.confidence_time
    }

    /// See also [`constants::DEFAULT_CONFIDENCE_BIAS`].
    #[must_use]
    pub fn confidence_bias(&self) -> f64 {
        self.confidence_bias
    }
}

impl Default for Parameters {
    /// Creates a default version of this struct with the parameters defined in [`constants`].
    fn default() -> Self {
        Parameters {
            base_elo: constants::DEFAULT_BASE_ELO,
            delta: constants::DEFAULT_DELTA,
            delta_odds: constants::DEFAULT_DELTA_ODDS,
            base_reward: constants::DEFAULT_BASE_REWARD,
            history_size: constants::DEFAULT_HISTORY_SIZE,
            k_max: constants::DEFAULT_K_MAX,
            confidence_time: constants::DEFAULT_CONFIDENCE_TIME,
            confidence_bias: constants::DEFAULT_CONFIDENCE_BIAS,
        }
    }
}
