//! Elo logistic win probability.
//!
//! `p_home = 1 / (1 + 10^(-diff / 400))` where `diff` is the home rating
//! (plus home advantage, unless the game is at a neutral site) minus the away
//! rating. A 400 point edge is worth 10:1 odds.

/// Rating points per factor-of-ten change in odds.
const ELO_SCALE: f64 = 400.0;

/// Probability that the home side wins.
///
/// # Arguments
/// * `rating_home`    – Home team's rating.
/// * `rating_away`    – Away team's rating.
/// * `home_advantage` – Rating bonus for playing at home.
/// * `neutral`        – Neutral site: `home_advantage` is ignored.
///
/// Strictly increasing in the effective rating difference. At a neutral site
/// swapping the two sides yields the complementary probability.
pub fn win_probability(rating_home: f64, rating_away: f64, home_advantage: f64, neutral: bool) -> f64 {
    let diff = if neutral {
        rating_home - rating_away
    } else {
        rating_home + home_advantage - rating_away
    };
    1.0 / (1.0 + 10.0_f64.powf(-diff / ELO_SCALE))
}
