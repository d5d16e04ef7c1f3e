//! Tabular output: CSV files and console tables.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::db::models::{AuditRecord, RatingRow, SimulationRun, TeamOdds};
use crate::elo::RatingTable;
use crate::playoffs::{BracketTrace, Conference, Round};

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// `team,final_elo`, best team first
pub fn write_ratings_csv(path: &Path, ratings: &RatingTable) -> Result<()> {
    write_csv(path, &ratings.leaderboard())
}

pub fn read_ratings_csv(path: &Path) -> Result<RatingTable> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open rating table {}", path.display()))?;
    let mut table = RatingTable::new();
    for row in rdr.deserialize::<RatingRow>() {
        let row = row.with_context(|| format!("Malformed rating row in {}", path.display()))?;
        if !row.final_elo.is_finite() {
            anyhow::bail!("rating for {} is not a finite number", row.team);
        }
        if table.contains(&row.team) {
            anyhow::bail!("team {} is listed more than once in {}", row.team, path.display());
        }
        table.insert(row.team, row.final_elo);
    }
    Ok(table)
}

pub fn write_audit_csv(path: &Path, audit: &[AuditRecord]) -> Result<()> {
    write_csv(path, audit)
}

pub fn write_odds_csv(path: &Path, odds: &[TeamOdds]) -> Result<()> {
    write_csv(path, odds)
}

/// Top and bottom `n` teams by rating
pub fn render_leaderboard(ratings: &RatingTable, n: usize) -> String {
    let board = ratings.leaderboard();
    let mut out = String::new();
    let _ = writeln!(out, "Top {} teams by Elo:", n.min(board.len()));
    for row in board.iter().take(n) {
        let _ = writeln!(out, "  {:<5} {:>8.1}", row.team, row.final_elo);
    }
    let _ = writeln!(out, "Bottom {} teams by Elo:", n.min(board.len()));
    for row in board.iter().skip(board.len().saturating_sub(n)) {
        let _ = writeln!(out, "  {:<5} {:>8.1}", row.team, row.final_elo);
    }
    out
}

/// Odds table, first `limit` rows
pub fn render_odds_table(odds: &[TeamOdds], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<5} {:<4} {:>4} {:>10} {:>10} {:>10} {:>10}",
        "Team", "Conf", "Seed", "Divisional", "Conf Champ", "Super Bowl", "Champion"
    );
    let _ = writeln!(out, "{}", "-".repeat(60));
    for o in odds.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:<5} {:<4} {:>4} {:>9.1}% {:>9.1}% {:>9.1}% {:>9.1}%",
            o.team,
            o.conference,
            o.seed,
            o.pct_make_divisional * 100.0,
            o.pct_make_conf_champ * 100.0,
            o.pct_make_superbowl * 100.0,
            o.pct_win_superbowl * 100.0,
        );
    }
    out
}

/// Audit rows, one line per game
pub fn render_audit(audit: &[AuditRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>5} {:>3}-{:<3} {:<5} {:>7} {:>6} {:>7} {:>7} {:>7}",
        "Date", "Away", "", "", "Home", "Elo H", "P(H)", "Delta", "Elo H'", "Elo A'"
    );
    for r in audit {
        let _ = writeln!(
            out,
            "{:<10} {:>5} {:>3}-{:<3} {:<5} {:>7.1} {:>6.3} {:>+7.2} {:>7.1} {:>7.1}",
            r.gameday.to_string(),
            r.away_team,
            r.away_score,
            r.home_score,
            r.home_team,
            r.elo_home_before,
            r.p_home_win,
            r.delta,
            r.elo_home_after,
            r.elo_away_after,
        );
    }
    out
}

/// Stored simulation runs, one line each
pub fn render_runs(runs: &[SimulationRun]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5} {:>6} {:>8} {:>20} {:>5}  Created",
        "Run", "Season", "Trials", "Seed", "HFA"
    );
    for run in runs {
        let _ = writeln!(
            out,
            "{:>5} {:>6} {:>8} {:>20} {:>5.1}  {}",
            run.id.map(|id| id.to_string()).unwrap_or_default(),
            run.season,
            run.trials,
            run.seed,
            run.home_advantage,
            run.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    out
}

/// Play-by-play of one bracket, grouped by conference and round
pub fn render_trace(trace: &BracketTrace) -> String {
    let mut out = String::new();
    for conference in Conference::ALL {
        for round in [Round::WildCard, Round::Divisional, Round::ConferenceChampionship] {
            let _ = writeln!(out, "\n--- {} {} ---", conference, round.label());
            for g in trace.round(round, Some(conference)) {
                let _ = writeln!(
                    out,
                    "  ({}) {} vs ({}) {}: P({} wins) = {:.3} -> Winner: {}",
                    g.home_seed, g.home, g.away_seed, g.away, g.home, g.p_home_win, g.winner
                );
            }
        }
    }
    let _ = writeln!(out, "\n--- {} (Neutral Site) ---", Round::SuperBowl.label());
    for g in trace.round(Round::SuperBowl, None) {
        let _ = writeln!(
            out,
            "  {} ({}) vs {} ({}): P({} wins) = {:.3} -> Winner: {}",
            g.home,
            Conference::Afc,
            g.away,
            Conference::Nfc,
            g.home,
            g.p_home_win,
            g.winner
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playoffs::TracedGame;

    fn table() -> RatingTable {
        let mut t = RatingTable::new();
        t.insert("DEN", 1712.5);
        t.insert("NYJ", 1381.25);
        t.insert("SEA", 1698.0);
        t
    }

    #[test]
    fn ratings_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("elo.csv");
        write_ratings_csv(&path, &table()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("team,final_elo\nDEN,1712.5\nSEA,1698"));
        assert_eq!(read_ratings_csv(&path).unwrap(), table());
    }

    #[test]
    fn duplicate_team_row_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elo.csv");
        fs::write(&path, "team,final_elo\nDEN,1712.5\nSEA,1698.0\nDEN,1400.0\n").unwrap();
        let err = read_ratings_csv(&path).unwrap_err();
        assert!(err.to_string().contains("DEN"), "{}", err);
    }

    #[test]
    fn read_missing_ratings_file_fails() {
        assert!(read_ratings_csv(Path::new("/nonexistent/elo.csv")).is_err());
    }

    #[test]
    fn odds_csv_has_expected_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odds.csv");
        let odds = vec![TeamOdds {
            team: "DEN".into(),
            conference: "AFC".into(),
            seed: 1,
            pct_make_divisional: 1.0,
            pct_make_conf_champ: 0.6,
            pct_make_superbowl: 0.4,
            pct_win_superbowl: 0.2,
        }];
        write_odds_csv(&path, &odds).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "team,conference,seed,pct_make_divisional,pct_make_conf_champ,pct_make_superbowl,pct_win_superbowl\n"
        ));
    }

    #[test]
    fn leaderboard_lists_best_and_worst() {
        let text = render_leaderboard(&table(), 1);
        assert!(text.contains("DEN"));
        assert!(text.contains("NYJ"));
        assert!(!text.contains("SEA"));
    }

    #[test]
    fn audit_renders_signed_delta() {
        let rec = AuditRecord {
            gameday: chrono::NaiveDate::from_ymd_opt(2025, 9, 4).unwrap(),
            home_team: "PHI".into(),
            away_team: "DAL".into(),
            home_score: 24,
            away_score: 20,
            elo_home_before: 1500.0,
            elo_away_before: 1500.0,
            p_home_win: 0.578,
            actual_home_win: 1,
            delta: 12.65,
            elo_home_after: 1512.65,
            elo_away_after: 1487.35,
        };
        let text = render_audit(&[rec]);
        assert!(text.contains("2025-09-04"));
        assert!(text.contains("+12.65"));
    }

    #[test]
    fn trace_renders_each_game() {
        let trace = BracketTrace {
            games: vec![
                TracedGame {
                    round: Round::WildCard,
                    conference: Some(Conference::Afc),
                    home: "NE".into(),
                    home_seed: 2,
                    away: "LAC".into(),
                    away_seed: 7,
                    neutral: false,
                    p_home_win: 0.634,
                    winner: "NE".into(),
                },
                TracedGame {
                    round: Round::SuperBowl,
                    conference: None,
                    home: "NE".into(),
                    home_seed: 2,
                    away: "SEA".into(),
                    away_seed: 1,
                    neutral: true,
                    p_home_win: 0.41,
                    winner: "SEA".into(),
                },
            ],
        };
        let text = render_trace(&trace);
        assert!(text.contains("(2) NE vs (7) LAC: P(NE wins) = 0.634 -> Winner: NE"));
        assert!(text.contains("NE (AFC) vs SEA (NFC): P(NE wins) = 0.410 -> Winner: SEA"));
    }
}
