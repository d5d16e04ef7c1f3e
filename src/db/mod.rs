use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::*;

use crate::elo::{EloParams, RatingRun, RatingTable};

/// Thread-safe SQLite store (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    /// Throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Ratings ───────────────────────────────────────────────────────────────

    /// Store a rating fold (final table + audit log); returns the snapshot id
    pub fn save_rating_run(&self, season: i32, elo: &EloParams, run: &RatingRun) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO rating_snapshots (
                season, k_factor, home_advantage, initial_rating, games, created_at
             ) VALUES (?1,?2,?3,?4,?5,?6)",
            params![
                season,
                elo.k_factor,
                elo.home_advantage,
                elo.initial_rating,
                run.audit.len() as i64,
                chrono::Utc::now(),
            ],
        )?;
        let snapshot_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO ratings (snapshot_id, team, rating) VALUES (?1,?2,?3)",
            )?;
            for (team, rating) in run.ratings.iter() {
                stmt.execute(params![snapshot_id, team, rating])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO audit_log (
                    snapshot_id, seq, gameday, home_team, away_team, home_score, away_score,
                    elo_home_before, elo_away_before, p_home_win, actual_home_win, delta,
                    elo_home_after, elo_away_after
                 ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
            )?;
            for (seq, rec) in run.audit.iter().enumerate() {
                stmt.execute(params![
                    snapshot_id,
                    seq as i64,
                    rec.gameday,
                    rec.home_team,
                    rec.away_team,
                    rec.home_score,
                    rec.away_score,
                    rec.elo_home_before,
                    rec.elo_away_before,
                    rec.p_home_win,
                    rec.actual_home_win,
                    rec.delta,
                    rec.elo_home_after,
                    rec.elo_away_after,
                ])?;
            }
        }

        tx.commit()?;
        Ok(snapshot_id)
    }

    /// Most recent rating snapshot for a season, if any
    pub fn latest_ratings(&self, season: i32) -> Result<Option<(i64, RatingTable)>> {
        let conn = self.conn()?;
        let snapshot_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM rating_snapshots WHERE season=?1 ORDER BY id DESC LIMIT 1",
                params![season],
                |row| row.get(0),
            )
            .optional()?;
        let Some(snapshot_id) = snapshot_id else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT team, rating FROM ratings WHERE snapshot_id=?1")?;
        let table = stmt
            .query_map(params![snapshot_id], |row| {
                Ok(RatingRow {
                    team: row.get(0)?,
                    final_elo: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<RatingTable>>()?;
        Ok(Some((snapshot_id, table)))
    }

    /// Audit log of a snapshot, in processing order
    pub fn list_audit(&self, snapshot_id: i64) -> Result<Vec<AuditRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT gameday, home_team, away_team, home_score, away_score,
                    elo_home_before, elo_away_before, p_home_win, actual_home_win, delta,
                    elo_home_after, elo_away_after
             FROM audit_log WHERE snapshot_id=?1 ORDER BY seq",
        )?;
        let records = stmt
            .query_map(params![snapshot_id], map_audit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    // ── Simulation runs ───────────────────────────────────────────────────────

    /// Store a simulation run and its odds table; returns the run id
    pub fn record_simulation(&self, run: &SimulationRun, odds: &[TeamOdds]) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO simulation_runs (season, trials, seed, home_advantage, created_at)
             VALUES (?1,?2,?3,?4,?5)",
            params![
                run.season,
                run.trials as i64,
                // stored bit-for-bit; SQLite integers are signed
                run.seed as i64,
                run.home_advantage,
                run.created_at,
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO run_odds (
                    run_id, team, conference, seed, pct_make_divisional,
                    pct_make_conf_champ, pct_make_superbowl, pct_win_superbowl
                 ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            )?;
            for o in odds {
                stmt.execute(params![
                    run_id,
                    o.team,
                    o.conference,
                    o.seed,
                    o.pct_make_divisional,
                    o.pct_make_conf_champ,
                    o.pct_make_superbowl,
                    o.pct_win_superbowl,
                ])?;
            }
        }

        tx.commit()?;
        Ok(run_id)
    }

    /// Recent simulation runs for a season, newest first
    pub fn list_runs(&self, season: i32, limit: i64) -> Result<Vec<SimulationRun>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, season, trials, seed, home_advantage, created_at
             FROM simulation_runs WHERE season=?1 ORDER BY id DESC LIMIT ?2",
        )?;
        let runs = stmt
            .query_map(params![season, limit], |row| {
                let trials: i64 = row.get(2)?;
                let seed: i64 = row.get(3)?;
                Ok(SimulationRun {
                    id: row.get(0)?,
                    season: row.get(1)?,
                    trials: trials as u64,
                    seed: seed as u64,
                    home_advantage: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }

    /// Odds table of a stored run, most likely champion first
    pub fn run_odds(&self, run_id: i64) -> Result<Vec<TeamOdds>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT team, conference, seed, pct_make_divisional, pct_make_conf_champ,
                    pct_make_superbowl, pct_win_superbowl
             FROM run_odds WHERE run_id=?1
             ORDER BY pct_win_superbowl DESC, pct_make_superbowl DESC, team",
        )?;
        let odds = stmt
            .query_map(params![run_id], |row| {
                Ok(TeamOdds {
                    team: row.get(0)?,
                    conference: row.get(1)?,
                    seed: row.get(2)?,
                    pct_make_divisional: row.get(3)?,
                    pct_make_conf_champ: row.get(4)?,
                    pct_make_superbowl: row.get(5)?,
                    pct_win_superbowl: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(odds)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

fn map_audit(row: &rusqlite::Row) -> rusqlite::Result<AuditRecord> {
    Ok(AuditRecord {
        gameday: row.get(0)?,
        home_team: row.get(1)?,
        away_team: row.get(2)?,
        home_score: row.get(3)?,
        away_score: row.get(4)?,
        elo_home_before: row.get(5)?,
        elo_away_before: row.get(6)?,
        p_home_win: row.get(7)?,
        actual_home_win: row.get(8)?,
        delta: row.get(9)?,
        elo_home_after: row.get(10)?,
        elo_away_after: row.get(11)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS rating_snapshots (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    season         INTEGER NOT NULL,
    k_factor       REAL    NOT NULL,
    home_advantage REAL    NOT NULL,
    initial_rating REAL    NOT NULL,
    games          INTEGER NOT NULL,
    created_at     TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS ratings (
    snapshot_id INTEGER NOT NULL,
    team        TEXT    NOT NULL,
    rating      REAL    NOT NULL,
    PRIMARY KEY (snapshot_id, team),
    FOREIGN KEY (snapshot_id) REFERENCES rating_snapshots(id)
);

CREATE TABLE IF NOT EXISTS audit_log (
    snapshot_id     INTEGER NOT NULL,
    seq             INTEGER NOT NULL,
    gameday         TEXT    NOT NULL,
    home_team       TEXT    NOT NULL,
    away_team       TEXT    NOT NULL,
    home_score      INTEGER NOT NULL,
    away_score      INTEGER NOT NULL,
    elo_home_before REAL    NOT NULL,
    elo_away_before REAL    NOT NULL,
    p_home_win      REAL    NOT NULL,
    actual_home_win INTEGER NOT NULL,
    delta           REAL    NOT NULL,
    elo_home_after  REAL    NOT NULL,
    elo_away_after  REAL    NOT NULL,
    PRIMARY KEY (snapshot_id, seq),
    FOREIGN KEY (snapshot_id) REFERENCES rating_snapshots(id)
);

CREATE TABLE IF NOT EXISTS simulation_runs (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    season         INTEGER NOT NULL,
    trials         INTEGER NOT NULL,
    seed           INTEGER NOT NULL,
    home_advantage REAL    NOT NULL,
    created_at     TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS run_odds (
    run_id              INTEGER NOT NULL,
    team                TEXT    NOT NULL,
    conference          TEXT    NOT NULL,
    seed                INTEGER NOT NULL,
    pct_make_divisional REAL    NOT NULL,
    pct_make_conf_champ REAL    NOT NULL,
    pct_make_superbowl  REAL    NOT NULL,
    pct_win_superbowl   REAL    NOT NULL,
    PRIMARY KEY (run_id, team),
    FOREIGN KEY (run_id) REFERENCES simulation_runs(id)
);

CREATE INDEX IF NOT EXISTS idx_rating_snapshots_season ON rating_snapshots(season);
CREATE INDEX IF NOT EXISTS idx_simulation_runs_season ON simulation_runs(season);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elo::compute_ratings;
    use chrono::{NaiveDate, Utc};

    fn sample_run() -> (EloParams, RatingRun) {
        let d = |day| NaiveDate::from_ymd_opt(2025, 9, day).unwrap();
        let games = vec![
            Match::new(d(4), "PHI", "DAL", 24, 20),
            Match::new(d(7), "BUF", "BAL", 41, 40),
            Match::new(d(14), "BAL", "PHI", 30, 10),
        ];
        let params = EloParams::default();
        let run = compute_ratings(&games, &params).unwrap();
        (params, run)
    }

    #[test]
    fn rating_run_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let (params, run) = sample_run();

        let id = db.save_rating_run(2025, &params, &run).unwrap();
        let (latest_id, table) = db.latest_ratings(2025).unwrap().unwrap();
        assert_eq!(latest_id, id);
        assert_eq!(table, run.ratings);
        assert_eq!(db.list_audit(id).unwrap(), run.audit);
    }

    #[test]
    fn latest_ratings_picks_newest_snapshot_of_season() {
        let db = Database::open_in_memory().unwrap();
        let (params, run) = sample_run();
        db.save_rating_run(2025, &params, &run).unwrap();
        let second = db.save_rating_run(2025, &params, &run).unwrap();
        db.save_rating_run(2024, &params, &run).unwrap();

        assert_eq!(db.latest_ratings(2025).unwrap().unwrap().0, second);
        assert!(db.latest_ratings(2023).unwrap().is_none());
    }

    #[test]
    fn simulation_run_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let run = SimulationRun {
            id: None,
            season: 2025,
            trials: 10_000,
            seed: u64::MAX - 3,
            home_advantage: 55.0,
            created_at: Utc::now(),
        };
        let odds = vec![
            TeamOdds {
                team: "DEN".into(),
                conference: "AFC".into(),
                seed: 1,
                pct_make_divisional: 1.0,
                pct_make_conf_champ: 0.7,
                pct_make_superbowl: 0.45,
                pct_win_superbowl: 0.25,
            },
            TeamOdds {
                team: "GB".into(),
                conference: "NFC".into(),
                seed: 7,
                pct_make_divisional: 0.3,
                pct_make_conf_champ: 0.1,
                pct_make_superbowl: 0.04,
                pct_win_superbowl: 0.01,
            },
        ];

        let id = db.record_simulation(&run, &odds).unwrap();
        let runs = db.list_runs(2025, 10).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, Some(id));
        assert_eq!(runs[0].seed, u64::MAX - 3);
        assert_eq!(runs[0].trials, 10_000);
        assert_eq!(db.run_odds(id).unwrap(), odds);
    }
}
