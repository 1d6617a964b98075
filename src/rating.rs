use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::trace;

use crate::algorithm;
use crate::constants::DEFAULT_RETRO_ELO_ITERATIONS;
use crate::util::BoundedHistory;
use crate::Parameters;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of a game from the point of view of one side. There are no draws.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameResult {
    Win,
    Loss,
}

impl GameResult {
    /// `1.0` for a win, `-1.0` for a loss.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            GameResult::Win => 1.0,
            GameResult::Loss => -1.0,
        }
    }

    #[must_use]
    pub fn invert(self) -> Self {
        match self {
            GameResult::Win => GameResult::Loss,
            GameResult::Loss => GameResult::Win,
        }
    }
}

/// What [`Rating::adjust`] needs to know about a game besides the reward.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GameData {
    result: GameResult,
    confidence: f64,
    date: SystemTime,
    initial_elo: f64,
    initial_opponent_elo: f64,
}

impl GameData {
    /// # Arguments
    ///
    /// * `result` - The outcome for the rating being adjusted
    /// * `confidence` - How much this game counts as signal, in `[0, 1]`
    /// * `date` - When the game was played
    /// * `initial_elo` - Elo of the rating being adjusted, **before** the game
    /// * `initial_opponent_elo` - Elo of the opponent, **before** the game
    #[must_use]
    pub fn new(
        result: GameResult,
        confidence: f64,
        date: SystemTime,
        initial_elo: f64,
        initial_opponent_elo: f64,
    ) -> Self {
        GameData {
            result,
            confidence,
            date,
            initial_elo,
            initial_opponent_elo,
        }
    }

    #[must_use]
    pub fn result(&self) -> GameResult {
        self.result
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub fn date(&self) -> SystemTime {
        self.date
    }

    #[must_use]
    pub fn initial_elo(&self) -> f64 {
        self.initial_elo
    }

    #[must_use]
    pub fn initial_opponent_elo(&self) -> f64 {
        self.initial_opponent_elo
    }
}

/// One past game as remembered by a [`Rating`].
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryEntry {
    result: GameResult,
    adjust: f64,
    score: f64,
    confidence: f64,
    date: SystemTime,
    initial_elo: f64,
    initial_opponent_elo: f64,
}

impl HistoryEntry {
    /// Creates the entry for `game`, after `adjust` was applied and the cumulative score became `score`.
    #[must_use]
    pub fn from_game(game: GameData, adjust: f64, score: f64) -> Self {
        HistoryEntry {
            result: game.result,
            adjust,
            score,
            confidence: game.confidence,
            date: game.date,
            initial_elo: game.initial_elo,
            initial_opponent_elo: game.initial_opponent_elo,
        }
    }

    #[must_use]
    pub fn result(&self) -> GameResult {
        self.result
    }

    /// The signed reward that was applied.
    #[must_use]
    pub fn adjust(&self) -> f64 {
        self.adjust
    }

    /// The cumulative score right after this game.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// The confidence assigned to this game when it was recorded.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub fn date(&self) -> SystemTime {
        self.date
    }

    #[must_use]
    pub fn initial_elo(&self) -> f64 {
        self.initial_elo
    }

    #[must_use]
    pub fn initial_opponent_elo(&self) -> f64 {
        self.initial_opponent_elo
    }
}

/// Plain snapshot of a [`Rating`], for persistence layers.
///
/// Take one with [`Rating::state`] and turn it back into a rating with
/// [`Manager::restore_rating`][crate::Manager::restore_rating].
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RatingState {
    pub elo: f64,
    pub score: f64,
    pub confidence: f64,
    pub k: f64,
    /// Newest first.
    pub history: Vec<HistoryEntry>,
    pub last_update: Option<SystemTime>,
}

/// The rating of one competitor.
///
/// Ratings are created by a [`Manager`][crate::Manager] and share its [`Parameters`].
/// A rating is only ever mutated through [`Rating::adjust`] and [`Rating::update_confidence`],
/// usually both driven by [`Manager::register_win`][crate::Manager::register_win].
#[derive(Clone, PartialEq, Debug)]
pub struct Rating {
    parameters: Arc<Parameters>,
    elo: f64,
    score: f64,
    confidence: f64,
    k: f64,
    history: BoundedHistory<HistoryEntry>,
    last_update: Option<SystemTime>,
}

impl Rating {
    pub(crate) fn new(parameters: Arc<Parameters>) -> Self {
        let base_elo = parameters.base_elo();

        Rating {
            parameters,
            elo: base_elo,
            score: base_elo,
            confidence: 0.0,
            k: 1.0,
            history: BoundedHistory::new(),
            last_update: None,
        }
    }

    /// Rebuilds a rating from `state`, bringing it back within the invariants of `parameters`.
    pub(crate) fn from_state(parameters: Arc<Parameters>, state: RatingState) -> Self {
        let history_size = if parameters.keeps_history() {
            parameters.history_size()
        } else {
            0
        };
        let history = BoundedHistory::from_newest_first(state.history, history_size);
        let k_max = parameters.k_max();

        Rating {
            parameters,
            elo: state.elo,
            score: state.score,
            confidence: state.confidence.clamp(0.0, 1.0),
            k: state.k.clamp(1.0, k_max),
            history,
            last_update: state.last_update,
        }
    }

    /// Takes a snapshot of everything but the shared parameters.
    #[must_use]
    pub fn state(&self) -> RatingState {
        RatingState {
            elo: self.elo,
            score: self.score,
            confidence: self.confidence,
            k: self.k,
            history: self.history.iter().copied().collect(),
            last_update: self.last_update,
        }
    }

    /// Applies the outcome of one game.
    ///
    /// `adjust_value` is always added to the raw [`Rating::score`].
    /// When history is enabled, the game is recorded and the elo becomes the confidence-weighted
    /// average of the retained scores, but only if that moves the elo in the same direction as
    /// `adjust_value`. Otherwise the elo stays where it is for now.
    pub fn adjust(&mut self, adjust_value: f64, game: GameData) {
        let parameters = *self.parameters;

        self.score += adjust_value;

        if !parameters.keeps_history() {
            self.elo = self.score;
            self.history.clear();
            return;
        }

        self.history.push_front(
            HistoryEntry::from_game(game, adjust_value, self.score),
            parameters.history_size(),
        );

        let Some(new_elo) = self.weighted_score() else {
            trace!(score = self.score, "no confidence in retained history, elo left as is");
            return;
        };

        let consistent = (adjust_value > 0.0 && new_elo > self.elo)
            || (adjust_value < 0.0 && new_elo < self.elo);

        if consistent {
            self.elo = new_elo;
        } else {
            trace!(
                elo = self.elo,
                new_elo,
                adjust_value,
                "smoothed elo moves against the game result, elo left as is"
            );
        }
    }

    /// Average of the retained scores weighted by their confidence,
    /// or [`None`] if there is no weight at all.
    fn weighted_score(&self) -> Option<f64> {
        let (weighted_sum, weight_sum) = self
            .history
            .iter()
            .fold((0.0, 0.0), |(weighted_sum, weight_sum), entry| {
                (
                    weighted_sum + entry.score * entry.confidence,
                    weight_sum + entry.confidence,
                )
            });

        if weight_sum <= 0.0 {
            return None;
        }

        let average = weighted_sum / weight_sum;
        average.is_finite().then_some(average)
    }

    /// Recomputes the confidence and the k-factor as of `time`.
    ///
    /// Every retained game contributes its confidence, decayed by its age (see [`algorithm::age_factor`]).
    /// The sum is divided by the configured history size rather than by the number of retained games,
    /// so a rating with few games is less confident than one with a full history.
    /// Without history, a rating is always fully confident and k is 1.
    pub fn update_confidence(&mut self, time: SystemTime) {
        let parameters = *self.parameters;

        self.last_update = Some(time);

        if !parameters.keeps_history() {
            self.confidence = 1.0;
            self.k = 1.0;
            return;
        }

        let decayed_sum: f64 = self
            .history
            .iter()
            .map(|entry| {
                // Games dated after `time` count as fresh.
                let age = time.duration_since(entry.date).unwrap_or(Duration::ZERO);

                entry.confidence * algorithm::age_factor(age, parameters)
            })
            .sum();

        // History sizes are nowhere near 2^52.
        #[allow(clippy::cast_precision_loss)]
        let confidence = decayed_sum / parameters.history_size() as f64;

        self.confidence = confidence.clamp(0.0, 1.0);
        self.k = algorithm::k_factor(self.confidence, parameters);
    }

    /// [`Rating::retro_elo_with`] seeded with the current elo,
    /// with [`DEFAULT_RETRO_ELO_ITERATIONS`] iterations.
    #[must_use]
    pub fn retro_elo(&self) -> Option<f64> {
        self.retro_elo_with(self.elo, DEFAULT_RETRO_ELO_ITERATIONS)
    }

    /// Estimates the elo that would make the retained history look unbiased,
    /// i.e. where the total surprise of the wins matches the total surprise of the losses.
    ///
    /// This is a best-effort diagnostic and has no effect on the rating.
    /// When the history holds only wins or only losses, a symmetric bias growing with each
    /// iteration is added to both sides so the odds stay defined.
    ///
    /// Returns [`None`] when history is disabled or empty, or when `iterations` is 0.
    #[must_use]
    pub fn retro_elo_with(&self, seed_elo: f64, iterations: u32) -> Option<f64> {
        let parameters = *self.parameters;

        if !parameters.keeps_history() || self.history.is_empty() || iterations == 0 {
            return None;
        }

        let mut retro_elo = seed_elo;

        for i in 0..iterations {
            let mut win_sum = 0.0;
            let mut lose_sum = 0.0;

            for entry in &self.history {
                let p = algorithm::elo_win_probability(
                    retro_elo,
                    entry.initial_opponent_elo,
                    parameters,
                );

                match entry.result {
                    GameResult::Win => win_sum += 1.0 - p,
                    GameResult::Loss => lose_sum += p,
                }
            }

            if win_sum <= 0.0 || lose_sum <= 0.0 {
                let bias = (f64::from(i + 1) / f64::from(iterations)).powi(2);
                win_sum += bias;
                lose_sum += bias;
            }

            retro_elo =
                algorithm::elo_from_odds_against_elo(win_sum / lose_sum, retro_elo, parameters);

            trace!(iteration = i, win_sum, lose_sum, retro_elo, "retro elo pass");
        }

        retro_elo.is_finite().then_some(retro_elo)
    }

    /// See [`algorithm::power_level`].
    #[must_use]
    pub fn power_level(&self) -> f64 {
        algorithm::power_level(self.elo, *self.parameters)
    }

    /// The published skill estimate.
    #[must_use]
    pub fn elo(&self) -> f64 {
        self.elo
    }

    /// The raw sum of every reward ever applied, on top of the base elo.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// How much recent, reliable history this rating has, in `[0, 1]`.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// The current k-factor, in `[1, k_max]`.
    #[must_use]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Retained games, newest first.
    #[must_use]
    pub fn history(&self) -> &BoundedHistory<HistoryEntry> {
        &self.history
    }

    /// When the confidence was last recomputed.
    #[must_use]
    pub fn last_update(&self) -> Option<SystemTime> {
        self.last_update
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, SystemTime};

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use proptest::prelude::*;

    use super::{GameData, GameResult, Rating};
    use crate::{Manager, Parameters};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn rating(parameters: Parameters) -> Rating {
        Manager::new(parameters).unwrap().create_rating()
    }

    fn game(result: GameResult, confidence: f64, opponent_elo: f64) -> GameData {
        GameData::new(result, confidence, SystemTime::UNIX_EPOCH, 1000.0, opponent_elo)
    }

    #[test]
    fn fresh_rating() {
        let rating = rating(Parameters::default().with_base_elo(1200.0));

        assert_eq!(rating.elo(), 1200.0);
        assert_eq!(rating.score(), 1200.0);
        assert_eq!(rating.confidence(), 0.0);
        assert_eq!(rating.k(), 1.0);
        assert!(rating.history().is_empty());
        assert_eq!(rating.last_update(), None);
    }

    #[test]
    fn no_history_is_a_running_sum() {
        for history_size in [0, 1] {
            let mut rating = rating(Parameters::default().with_history_size(history_size));

            rating.adjust(12.5, game(GameResult::Win, 1.0, 1000.0));
            rating.adjust(-2.5, game(GameResult::Loss, 1.0, 1000.0));

            assert_eq!(rating.score(), 1010.0);
            assert_eq!(rating.elo(), rating.score());
            assert!(rating.history().is_empty());

            rating.update_confidence(SystemTime::UNIX_EPOCH);
            assert_eq!(rating.confidence(), 1.0);
            assert_eq!(rating.k(), 1.0);
        }
    }

    #[test]
    fn elo_is_confidence_weighted_average() {
        let mut rating = rating(Parameters::default().with_history_size(10));

        rating.adjust(10.0, game(GameResult::Win, 1.0, 1000.0));
        assert_relative_eq!(rating.elo(), 1010.0);

        // Scores 1010 (weight 1) and 1040 (weight 0.5)
        rating.adjust(30.0, game(GameResult::Win, 0.5, 1000.0));
        assert_relative_eq!(rating.elo(), 1020.0);
        assert_relative_eq!(rating.score(), 1040.0);

        let newest = rating.history().newest().unwrap();
        assert_eq!(newest.result(), GameResult::Win);
        assert_relative_eq!(newest.adjust(), 30.0);
        assert_relative_eq!(newest.score(), 1040.0);
        assert_relative_eq!(newest.confidence(), 0.5);
    }

    #[test]
    fn elo_never_moves_against_the_result() {
        let mut rating = rating(Parameters::default().with_history_size(2));

        rating.adjust(10.0, game(GameResult::Win, 1.0, 1000.0));
        rating.adjust(-100.0, game(GameResult::Loss, 1.0, 1000.0));
        assert_relative_eq!(rating.elo(), 960.0);

        // The window is now [915, 910]: its average went down although this is a win.
        rating.adjust(5.0, game(GameResult::Win, 1.0, 1000.0));
        assert_relative_eq!(rating.score(), 915.0);
        assert_relative_eq!(rating.elo(), 960.0);
        assert_eq!(rating.history().len(), 2);
    }

    #[test]
    fn zero_confidence_skips_elo_update() {
        let mut rating = rating(Parameters::default().with_history_size(5));

        rating.adjust(10.0, game(GameResult::Win, 0.0, 1000.0));

        assert_eq!(rating.elo(), 1000.0);
        assert_eq!(rating.score(), 1010.0);
        assert_eq!(rating.history().len(), 1);
    }

    #[test]
    fn confidence_decays_with_age() {
        let parameters = Parameters::default()
            .with_history_size(4)
            .with_k_max(10.0)
            .with_confidence_time(10 * DAY);
        let mut rating = rating(parameters);
        let start = SystemTime::UNIX_EPOCH + 1000 * DAY;

        rating.adjust(
            10.0,
            GameData::new(GameResult::Win, 1.0, start, 1000.0, 1000.0),
        );
        rating.adjust(
            10.0,
            GameData::new(GameResult::Win, 1.0, start + 10 * DAY, 1010.0, 1000.0),
        );

        rating.update_confidence(start + 10 * DAY);
        // (1 + 1) / 4
        assert_relative_eq!(rating.confidence(), 0.5);
        assert_relative_eq!(rating.k(), 1.0 + 9.0 * 0.25);

        rating.update_confidence(start + 20 * DAY);
        // (0.5 + 1) / 4
        assert_relative_eq!(rating.confidence(), 0.375);
        assert_relative_eq!(rating.k(), 1.0 + 9.0 * 0.625 * 0.625);
        assert_eq!(rating.last_update(), Some(start + 20 * DAY));
    }

    #[test]
    fn retro_elo_needs_history() {
        assert_eq!(rating(Parameters::default()).retro_elo(), None);

        let mut rating = rating(Parameters::default().with_history_size(5));
        assert_eq!(rating.retro_elo(), None);

        rating.adjust(10.0, game(GameResult::Win, 1.0, 1000.0));
        assert!(rating.retro_elo().is_some());
        assert_eq!(rating.retro_elo_with(1000.0, 0), None);
    }

    #[test]
    fn retro_elo_balances_surprise() {
        let mut rating = rating(Parameters::default().with_history_size(5));

        // A win against 1100 and a loss against 900 are equally surprising at 1000.
        rating.adjust(10.0, game(GameResult::Win, 1.0, 1100.0));
        rating.adjust(-10.0, game(GameResult::Loss, 1.0, 900.0));

        assert_abs_diff_eq!(
            rating.retro_elo_with(1000.0, 3).unwrap(),
            1000.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn retro_elo_follows_one_sided_history() {
        let mut winner = rating(Parameters::default().with_history_size(5));
        let mut loser = winner.clone();

        for _ in 0..3 {
            winner.adjust(10.0, game(GameResult::Win, 1.0, 1000.0));
            loser.adjust(-10.0, game(GameResult::Loss, 1.0, 1000.0));
        }

        let winner_retro = winner.retro_elo_with(1000.0, 3).unwrap();
        let loser_retro = loser.retro_elo_with(1000.0, 3).unwrap();

        assert!(winner_retro > 1000.0);
        assert!(loser_retro < 1000.0);
    }

    #[test]
    fn restored_state_behaves_identically() {
        let manager = Manager::new(Parameters::default().with_history_size(3)).unwrap();
        let mut original = manager.create_rating();

        original.adjust(10.0, game(GameResult::Win, 0.7, 1000.0));
        original.adjust(-4.0, game(GameResult::Loss, 0.3, 1100.0));
        original.update_confidence(SystemTime::UNIX_EPOCH + DAY);

        let mut restored = manager.restore_rating(original.state());
        assert_eq!(restored, original);

        let next = game(GameResult::Win, 0.9, 950.0);
        original.adjust(7.0, next);
        restored.adjust(7.0, next);
        original.update_confidence(SystemTime::UNIX_EPOCH + 2 * DAY);
        restored.update_confidence(SystemTime::UNIX_EPOCH + 2 * DAY);

        assert_eq!(restored.state(), original.state());
    }

    #[test]
    fn restoring_enforces_invariants() {
        let manager = Manager::new(Parameters::default().with_history_size(2)).unwrap();
        let mut source = manager.create_rating();
        for _ in 0..2 {
            source.adjust(1.0, game(GameResult::Win, 1.0, 1000.0));
        }

        let mut state = source.state();
        state.history.push(state.history[0]);
        state.confidence = 3.0;
        state.k = 0.0;

        let restored = manager.restore_rating(state);
        assert_eq!(restored.history().len(), 2);
        assert_eq!(restored.confidence(), 1.0);
        assert_eq!(restored.k(), 1.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_survives_json() {
        let manager = Manager::new(Parameters::default().with_history_size(3)).unwrap();
        let mut rating = manager.create_rating();
        rating.adjust(10.0, game(GameResult::Win, 0.5, 1000.0));
        rating.update_confidence(SystemTime::UNIX_EPOCH + DAY);

        let json = serde_json::to_string(&rating.state()).unwrap();
        let state = serde_json::from_str(&json).unwrap();

        assert_eq!(manager.restore_rating(state), rating);
    }

    fn adjustments() -> impl Strategy<Value = Vec<(f64, f64, u32)>> {
        prop::collection::vec((-50.0..50.0f64, 0.0..=1.0f64, 0..400u32), 1..60)
    }

    proptest! {
        #[test]
        fn adjust_keeps_invariants(history_size in 0..8usize, games in adjustments()) {
            let parameters = Parameters::default()
                .with_history_size(history_size)
                .with_confidence_time(30 * DAY);
            let mut rating = rating(parameters);
            let mut time = SystemTime::UNIX_EPOCH;

            for (adjust_value, confidence, days) in games {
                time += days * DAY;
                let result = if adjust_value >= 0.0 { GameResult::Win } else { GameResult::Loss };
                let elo_before = rating.elo();

                rating.adjust(adjust_value, GameData::new(result, confidence, time, elo_before, 1000.0));

                if adjust_value > 0.0 {
                    prop_assert!(rating.elo() >= elo_before);
                } else if adjust_value < 0.0 {
                    prop_assert!(rating.elo() <= elo_before);
                }

                if history_size <= 1 {
                    prop_assert_eq!(rating.elo(), rating.score());
                    prop_assert!(rating.history().is_empty());
                } else {
                    prop_assert!(rating.history().len() <= history_size);
                }

                rating.update_confidence(time);
                prop_assert!((0.0..=1.0).contains(&rating.confidence()));
                prop_assert!((1.0..=parameters.k_max()).contains(&rating.k()));
            }
        }
    }
}
