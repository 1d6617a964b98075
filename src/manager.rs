use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::rating::{GameData, GameResult, Rating, RatingState};
use crate::{algorithm, ConfigError, Parameters};

/// Owns the [`Parameters`] of the rating model and registers games between [`Rating`]s.
///
/// Cloning a manager is cheap: clones share the same parameters,
/// and so do all the ratings they create.
#[derive(Clone, PartialEq, Debug)]
pub struct Manager {
    parameters: Arc<Parameters>,
}

impl Manager {
    /// Creates a new [`Manager`] after validating `parameters`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `parameters` break one of the invariants
    /// checked by [`Parameters::validate`].
    pub fn new(parameters: Parameters) -> Result<Self, ConfigError> {
        parameters.validate()?;

        Ok(Manager {
            parameters: Arc::new(parameters),
        })
    }

    /// Creates a rating at the base elo, with no confidence and a k-factor of 1.
    #[must_use]
    pub fn create_rating(&self) -> Rating {
        Rating::new(Arc::clone(&self.parameters))
    }

    /// Rebuilds a rating from a snapshot taken with [`Rating::state`].
    ///
    /// History beyond the configured size is dropped, oldest first.
    /// Confidence and k are clamped to their valid ranges.
    #[must_use]
    pub fn restore_rating(&self, state: RatingState) -> Rating {
        let capacity = if self.parameters.keeps_history() {
            self.parameters.history_size()
        } else {
            0
        };

        if state.history.len() > capacity {
            warn!(
                retained = state.history.len(),
                capacity, "restored rating has more history than configured, dropping the oldest games"
            );
        }

        Rating::from_state(Arc::clone(&self.parameters), state)
    }

    /// See [`algorithm::elo_odds`].
    #[must_use]
    pub fn elo_odds(&self, elo_a: f64, elo_b: f64) -> f64 {
        algorithm::elo_odds(elo_a, elo_b, *self.parameters)
    }

    /// Odds of `rating_a` beating `rating_b`.
    #[must_use]
    pub fn odds(&self, rating_a: &Rating, rating_b: &Rating) -> f64 {
        self.elo_odds(rating_a.elo(), rating_b.elo())
    }

    /// See [`algorithm::elo_win_probability`].
    #[must_use]
    pub fn elo_win_probability(&self, elo_a: f64, elo_b: f64) -> f64 {
        algorithm::elo_win_probability(elo_a, elo_b, *self.parameters)
    }

    /// Probability of `rating_a` beating `rating_b`.
    #[must_use]
    pub fn win_probability(&self, rating_a: &Rating, rating_b: &Rating) -> f64 {
        self.elo_win_probability(rating_a.elo(), rating_b.elo())
    }

    /// See [`algorithm::power_level`].
    #[must_use]
    pub fn power_level(&self, elo: f64) -> f64 {
        algorithm::power_level(elo, *self.parameters)
    }

    /// See [`algorithm::elo_win_reward`].
    #[must_use]
    pub fn elo_win_reward(&self, winner_elo: f64, loser_elo: f64) -> f64 {
        algorithm::elo_win_reward(winner_elo, loser_elo, *self.parameters)
    }

    /// Reward `winner` would get for beating `loser`, before k-factors are applied.
    #[must_use]
    pub fn win_reward(&self, winner: &Rating, loser: &Rating) -> f64 {
        self.elo_win_reward(winner.elo(), loser.elo())
    }

    /// See [`algorithm::elo_from_odds_against_elo`].
    #[must_use]
    pub fn elo_from_odds_against_elo(&self, odds: f64, against_elo: f64) -> f64 {
        algorithm::elo_from_odds_against_elo(odds, against_elo, *self.parameters)
    }

    /// [`Manager::register_win`] at the current system time.
    pub fn register_win_now(&self, winner: &mut Rating, loser: &mut Rating) {
        self.register_win(winner, loser, SystemTime::now());
    }

    /// Advances both ratings by one game that `winner` won against `loser` at `time`.
    ///
    /// Both ratings should come from this manager, or one sharing equal parameters.
    ///
    /// 1. The base reward is computed from the elos before the game.
    /// 2. Both confidences are brought up to date with `time`.
    /// 3. Each side scales the reward by its k-factor relative to its opponent's,
    ///    so the more uncertain side moves more.
    /// 4. Both sides record the game with a confidence derived from the confidence of both players.
    /// 5. Confidences and k-factors are refreshed again to account for the new game.
    pub fn register_win(&self, winner: &mut Rating, loser: &mut Rating, time: SystemTime) {
        let parameters = *self.parameters;

        let winner_initial_elo = winner.elo();
        let loser_initial_elo = loser.elo();

        let reward = algorithm::elo_win_reward(winner_initial_elo, loser_initial_elo, parameters);

        winner.update_confidence(time);
        loser.update_confidence(time);

        let winner_k = winner.k() / loser.k();
        let loser_k = loser.k() / winner.k();

        let game_confidence =
            algorithm::game_confidence(winner.confidence(), loser.confidence(), parameters);
        let winner_confidence = algorithm::side_confidence(game_confidence, winner_k, parameters);
        let loser_confidence = algorithm::side_confidence(game_confidence, loser_k, parameters);

        debug!(
            winner_elo = winner_initial_elo,
            loser_elo = loser_initial_elo,
            reward,
            winner_k,
            loser_k,
            game_confidence,
            "registering win"
        );

        winner.adjust(
            winner_k * reward,
            GameData::new(
                GameResult::Win,
                winner_confidence,
                time,
                winner_initial_elo,
                loser_initial_elo,
            ),
        );
        loser.adjust(
            -loser_k * reward,
            GameData::new(
                GameResult::Loss,
                loser_confidence,
                time,
                loser_initial_elo,
                winner_initial_elo,
            ),
        );

        winner.update_confidence(time);
        loser.update_confidence(time);
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}
