pub mod nflverse;
pub mod provider;

pub use nflverse::{LocalSchedule, NflverseSchedule};
pub use provider::ScheduleProvider;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use tracing::{info, warn};

use crate::db::models::Match;

/// Regular-season game type code
const REGULAR_SEASON: &str = "REG";

/// One row of an nflverse-style schedule. Unplayed games have no scores.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleRow {
    pub game_id: String,
    pub season: i32,
    /// "REG", "WC", "DIV", "CON", "SB"
    pub game_type: String,
    pub gameday: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub home_score: Option<i32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub away_score: Option<i32>,
}

/// Parse an nflverse `games.csv` body. Extra columns are ignored and
/// missing scores (`NA` or empty) become `None`.
pub fn parse_schedule_csv<R: Read>(reader: R) -> Result<Vec<ScheduleRow>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (idx, record) in rdr.deserialize::<ScheduleRow>().enumerate() {
        // idx + 2: header is line 1
        let row = record.with_context(|| format!("Malformed schedule row at line {}", idx + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Completed regular-season games, oldest first.
///
/// The sort is stable, so games on the same day keep their schedule order.
pub fn completed_regular_season(rows: &[ScheduleRow]) -> Vec<Match> {
    let regular: Vec<&ScheduleRow> = rows
        .iter()
        .filter(|row| row.game_type == REGULAR_SEASON)
        .collect();

    let mut games: Vec<Match> = regular
        .iter()
        .filter_map(|row| match (row.home_score, row.away_score) {
            (Some(home), Some(away)) => Some(Match::new(
                row.gameday,
                row.home_team.as_str(),
                row.away_team.as_str(),
                home,
                away,
            )),
            _ => None,
        })
        .collect();

    let unplayed = regular.len() - games.len();
    if unplayed > 0 {
        warn!("Skipping {} regular-season games without a final score", unplayed);
    }

    games.sort_by_key(|game| game.date);

    if let (Some(first), Some(last)) = (games.first(), games.last()) {
        info!(
            "{} completed regular-season games from {} to {}",
            games.len(),
            first.date,
            last.date
        );
    }
    games
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
game_id,season,game_type,week,gameday,weekday,gametime,away_team,away_score,home_team,home_score,location,result
2025_01_DAL_PHI,2025,REG,1,2025-09-04,Thursday,20:20,DAL,20,PHI,24,Home,4
2025_02_KC_PHI,2025,REG,2,2025-09-14,Sunday,16:25,KC,17,PHI,20,Home,3
2025_01_BAL_BUF,2025,REG,1,2025-09-07,Sunday,20:20,BAL,40,BUF,41,Home,1
2025_01_KC_LAC,2025,REG,1,2025-09-05,Friday,20:00,KC,21,LAC,27,Neutral,6
2025_18_NYG_DAL,2025,REG,18,2026-01-04,Sunday,13:00,NYG,NA,DAL,NA,Home,NA
2025_19_LAC_NE,2025,WC,19,2026-01-10,Saturday,16:30,LAC,,NE,,Home,
";

    #[test]
    fn parses_nflverse_layout() {
        let rows = parse_schedule_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].home_team, "PHI");
        assert_eq!(rows[0].home_score, Some(24));
        assert_eq!(rows[4].home_score, None);
        assert_eq!(rows[5].away_score, None);
        assert_eq!(rows[5].game_type, "WC");
    }

    #[test]
    fn keeps_completed_regular_season_in_date_order() {
        let rows = parse_schedule_csv(SAMPLE.as_bytes()).unwrap();
        let games = completed_regular_season(&rows);

        assert_eq!(games.len(), 4);
        let dates: Vec<_> = games.iter().map(|g| g.date.to_string()).collect();
        assert_eq!(dates, vec!["2025-09-04", "2025-09-05", "2025-09-07", "2025-09-14"]);
        assert!(games.iter().all(|g| g.home_team != "NE"));
    }

    #[test]
    fn same_day_games_keep_schedule_order() {
        let csv = "\
game_id,season,game_type,gameday,away_team,away_score,home_team,home_score
b,2025,REG,2025-09-07,NYJ,10,MIA,13
a,2025,REG,2025-09-07,CIN,31,CLE,17
";
        let games = completed_regular_season(&parse_schedule_csv(csv.as_bytes()).unwrap());
        assert_eq!(games[0].home_team, "MIA");
        assert_eq!(games[1].home_team, "CLE");
    }

    #[test]
    fn malformed_date_is_an_error() {
        let csv = "\
game_id,season,game_type,gameday,away_team,away_score,home_team,home_score
x,2025,REG,not-a-date,NYJ,10,MIA,13
";
        let err = parse_schedule_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
