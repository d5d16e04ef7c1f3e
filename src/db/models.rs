use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed game, as consumed by the rating fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
}

impl Match {
    pub fn new(
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_score: i32,
        away_score: i32,
    ) -> Self {
        Match {
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score,
            away_score,
        }
    }
}

/// One row of the rating fold's audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub gameday: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_score: i32,
    pub away_score: i32,
    pub elo_home_before: f64,
    pub elo_away_before: f64,
    /// Pre-game home win probability (home advantage applied)
    pub p_home_win: f64,
    /// 1 when the home team won outright, 0 otherwise
    pub actual_home_win: u8,
    /// Rating points transferred to the home team (negative when it lost ground)
    pub delta: f64,
    pub elo_home_after: f64,
    pub elo_away_after: f64,
}

impl AuditRecord {
    pub fn home_delta(&self) -> f64 {
        self.elo_home_after - self.elo_home_before
    }

    pub fn away_delta(&self) -> f64 {
        self.elo_away_after - self.elo_away_before
    }
}

/// A team's rating as written to / read from the rating table CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    pub team: String,
    pub final_elo: f64,
}

/// Per-team playoff odds produced by a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamOdds {
    pub team: String,
    pub conference: String,
    pub seed: u8,
    pub pct_make_divisional: f64,
    pub pct_make_conf_champ: f64,
    pub pct_make_superbowl: f64,
    pub pct_win_superbowl: f64,
}

/// Parameters of a stored simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: Option<i64>,
    pub season: i32,
    pub trials: u64,
    pub seed: u64,
    pub home_advantage: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
