//! The pure formulas of the rating model.
//!
//! Nothing in here mutates state. [`Manager`][crate::Manager] and [`Rating`][crate::Rating]
//! are thin layers on top of these functions.

use std::time::Duration;

use crate::Parameters;

/// Odds of a player with `elo_a` beating a player with `elo_b`.
///
/// Every [`Parameters::delta`] elo points of advantage multiply the odds by [`Parameters::delta_odds`].
/// The result is symmetric: `elo_odds(a, b) == 1.0 / elo_odds(b, a)`.
#[must_use]
pub fn elo_odds(elo_a: f64, elo_b: f64, parameters: Parameters) -> f64 {
    parameters
        .delta_odds()
        .powf((elo_a - elo_b) / parameters.delta())
}

/// Probability of a player with `elo_a` beating a player with `elo_b`.
#[must_use]
pub fn elo_win_probability(elo_a: f64, elo_b: f64, parameters: Parameters) -> f64 {
    let odds = elo_odds(elo_a, elo_b, parameters);

    // Same as odds / (odds + 1), but stays a number when the odds over- or underflow.
    1.0 / (1.0 + odds.recip())
}

/// Exponential transform of an elo, equal to [`Parameters::base_elo`] at the base elo.
/// Meant for display and ranking only.
#[must_use]
pub fn power_level(elo: f64, parameters: Parameters) -> f64 {
    parameters.base_elo() * elo_odds(elo, parameters.base_elo(), parameters)
}

/// Reward for the winner of a game, before any k-factor is applied.
///
/// An expected win is worth close to nothing, an even game is worth exactly
/// [`Parameters::base_reward`] and a total upset approaches twice that.
#[must_use]
pub fn elo_win_reward(winner_elo: f64, loser_elo: f64, parameters: Parameters) -> f64 {
    let p = elo_win_probability(winner_elo, loser_elo, parameters);

    2.0 * parameters.base_reward() * (1.0 - p)
}

/// The reward formula of early versions: `base_reward / sqrt(odds)`.
///
/// Good for small elo gaps, but it diverges quickly when an unexpected outcome happens.
/// It is kept for comparison and is never used by [`Manager::register_win`][crate::Manager::register_win].
#[must_use]
pub fn legacy_elo_win_reward(winner_elo: f64, loser_elo: f64, parameters: Parameters) -> f64 {
    parameters.base_reward() / elo_odds(winner_elo, loser_elo, parameters).sqrt()
}

/// The elo that has `odds` against a player rated `against_elo`.
/// Inverse of [`elo_odds`].
#[must_use]
pub fn elo_from_odds_against_elo(odds: f64, against_elo: f64, parameters: Parameters) -> f64 {
    against_elo + parameters.delta() * odds.ln() / parameters.delta_odds().ln()
}

/// How much a game between two ratings should count as signal,
/// given the current confidence of both sides.
///
/// This is the geometric mean of both biased confidences.
#[must_use]
pub fn game_confidence(
    winner_confidence: f64,
    loser_confidence: f64,
    parameters: Parameters,
) -> f64 {
    let bias_sq = parameters.confidence_bias() * parameters.confidence_bias();
    let winner = f64::min(1.0, bias_sq + winner_confidence);
    let loser = f64::min(1.0, bias_sq + loser_confidence);

    (winner * loser).sqrt()
}

/// The confidence one side records for a game.
///
/// `k_ratio` is the side's k-factor divided by its opponent's.
/// A side that is not more uncertain than its opponent (`k_ratio <= 1`) gets its confidence scaled up by `1 / k_ratio`.
#[must_use]
pub fn side_confidence(game_confidence: f64, k_ratio: f64, parameters: Parameters) -> f64 {
    let factor = if k_ratio <= 1.0 { k_ratio.recip() } else { 1.0 };

    f64::min(
        1.0,
        (parameters.confidence_bias() + game_confidence) * factor,
    )
}

/// Weight of a past game in the confidence of a rating, given how long ago it was played.
///
/// Games younger than [`Parameters::confidence_time`] count fully,
/// older ones decay as `confidence_time / age`.
#[must_use]
pub fn age_factor(age: Duration, parameters: Parameters) -> f64 {
    let confidence_time = parameters.confidence_time();

    if age <= confidence_time {
        1.0
    } else {
        confidence_time.as_secs_f64() / age.as_secs_f64()
    }
}

/// The k-factor for a given confidence: `kMax` at zero confidence, 1 at full confidence.
#[must_use]
pub fn k_factor(confidence: f64, parameters: Parameters) -> f64 {
    let uncertainty = (1.0 - confidence.clamp(0.0, 1.0)).powi(2);

    1.0 + (parameters.k_max() - 1.0) * uncertainty
}
