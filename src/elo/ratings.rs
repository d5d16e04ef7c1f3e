//! Sequential Elo fold over a season's completed games.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::models::{AuditRecord, Match, RatingRow};
use crate::error::{Result, SimError};

use super::win_probability::win_probability;

/// Starting rating for a team's first appearance
pub const DEFAULT_INITIAL_RATING: f64 = 1500.0;

/// Rating points at stake per game
pub const DEFAULT_K_FACTOR: f64 = 30.0;

/// Home-field advantage in rating points
pub const DEFAULT_HOME_ADVANTAGE: f64 = 55.0;

/// Tuning knobs for the rating fold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloParams {
    pub initial_rating: f64,
    pub k_factor: f64,
    pub home_advantage: f64,
}

impl Default for EloParams {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_INITIAL_RATING,
            k_factor: DEFAULT_K_FACTOR,
            home_advantage: DEFAULT_HOME_ADVANTAGE,
        }
    }
}

/// Team → rating snapshot.
///
/// Keyed by a `BTreeMap` so iteration (and therefore every table written from
/// it) is in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    ratings: BTreeMap<String, f64>,
}

impl RatingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.ratings.get(team).copied()
    }

    /// Rating for `team`, or a configuration error naming the missing team.
    pub fn require(&self, team: &str) -> Result<f64> {
        self.get(team)
            .ok_or_else(|| SimError::config(format!("no rating for team '{}'", team)))
    }

    pub fn insert(&mut self, team: impl Into<String>, rating: f64) {
        self.ratings.insert(team.into(), rating);
    }

    pub fn contains(&self, team: &str) -> bool {
        self.ratings.contains_key(team)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.ratings.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ratings.iter().map(|(team, &rating)| (team.as_str(), rating))
    }

    /// Teams sorted by rating, best first. Ties fall back to name order.
    pub fn leaderboard(&self) -> Vec<RatingRow> {
        let mut rows: Vec<RatingRow> = self
            .iter()
            .map(|(team, final_elo)| RatingRow {
                team: team.to_string(),
                final_elo,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.final_elo
                .partial_cmp(&a.final_elo)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.team.cmp(&b.team))
        });
        rows
    }

    /// Seed the rating for `team` if it has never been seen; returns its rating.
    fn rating_or_insert(&mut self, team: &str, initial: f64) -> f64 {
        *self.ratings.entry(team.to_string()).or_insert(initial)
    }
}

impl FromIterator<RatingRow> for RatingTable {
    fn from_iter<I: IntoIterator<Item = RatingRow>>(iter: I) -> Self {
        let mut table = RatingTable::new();
        for row in iter {
            table.insert(row.team, row.final_elo);
        }
        table
    }
}

/// Output of [`compute_ratings`]
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRun {
    pub ratings: RatingTable,
    /// One record per input game, in processing order
    pub audit: Vec<AuditRecord>,
}

/// 1 if the home team won outright.
///
/// A tied score counts as an away win: only a strictly higher home score
/// earns the home side a result of 1.
fn home_result(game: &Match) -> u8 {
    u8::from(game.home_score > game.away_score)
}

/// Fold `matches` into a rating table, oldest first.
///
/// The input must already be sorted by date; ties on the same date are
/// processed in the order given. Each update depends on the exact
/// post-state of the previous one, so the fold is strictly sequential.
pub fn compute_ratings(matches: &[Match], params: &EloParams) -> Result<RatingRun> {
    if let Some(pair) = matches.windows(2).find(|pair| pair[1].date < pair[0].date) {
        return Err(SimError::precondition(format!(
            "games out of chronological order: {} {}@{} follows {} {}@{}",
            pair[1].date,
            pair[1].away_team,
            pair[1].home_team,
            pair[0].date,
            pair[0].away_team,
            pair[0].home_team,
        )));
    }

    if let Some(game) = matches.iter().find(|game| game.home_team == game.away_team) {
        return Err(SimError::precondition(format!(
            "{} plays itself on {}",
            game.home_team, game.date
        )));
    }

    let mut ratings = RatingTable::new();
    let mut audit = Vec::with_capacity(matches.len());

    for game in matches {
        let elo_home = ratings.rating_or_insert(&game.home_team, params.initial_rating);
        let elo_away = ratings.rating_or_insert(&game.away_team, params.initial_rating);

        let p_home_win = win_probability(elo_home, elo_away, params.home_advantage, false);
        let actual = home_result(game);
        let delta = params.k_factor * (f64::from(actual) - p_home_win);

        let elo_home_after = elo_home + delta;
        let elo_away_after = elo_away - delta;
        ratings.insert(game.home_team.as_str(), elo_home_after);
        ratings.insert(game.away_team.as_str(), elo_away_after);

        audit.push(AuditRecord {
            gameday: game.date,
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            home_score: game.home_score,
            away_score: game.away_score,
            elo_home_before: elo_home,
            elo_away_before: elo_away,
            p_home_win,
            actual_home_win: actual,
            delta,
            elo_home_after,
            elo_away_after,
        });
    }

    debug!(
        "Rating fold complete: {} games, {} teams (K={}, HFA={})",
        audit.len(),
        ratings.len(),
        params.k_factor,
        params.home_advantage
    );

    Ok(RatingRun { ratings, audit })
}
