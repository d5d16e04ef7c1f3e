use serde::{Deserialize, Serialize};

use super::bracket::{GameObserver, PlayedGame, Round};
use super::seeding::Conference;

/// Owned copy of a [`PlayedGame`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedGame {
    pub round: Round,
    pub conference: Option<Conference>,
    pub home: String,
    pub home_seed: u8,
    pub away: String,
    pub away_seed: u8,
    pub neutral: bool,
    pub p_home_win: f64,
    pub winner: String,
}

/// Play-by-play of one bracket, in the order games were resolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BracketTrace {
    pub games: Vec<TracedGame>,
}

impl BracketTrace {
    /// Games of one round, optionally restricted to one conference
    pub fn round(&self, round: Round, conference: Option<Conference>) -> impl Iterator<Item = &TracedGame> {
        self.games
            .iter()
            .filter(move |g| g.round == round && (conference.is_none() || g.conference == conference))
    }

    pub fn champion(&self) -> Option<&str> {
        self.games
            .iter()
            .rev()
            .find(|g| g.round == Round::SuperBowl)
            .map(|g| g.winner.as_str())
    }
}

impl GameObserver for BracketTrace {
    fn on_game(&mut self, game: &PlayedGame<'_>) {
        self.games.push(TracedGame {
            round: game.round,
            conference: game.conference,
            home: game.home.to_string(),
            home_seed: game.home_seed,
            away: game.away.to_string(),
            away_seed: game.away_seed,
            neutral: game.neutral,
            p_home_win: game.p_home_win,
            winner: game.winner.to_string(),
        });
    }
}
