use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::elo::ratings::{DEFAULT_HOME_ADVANTAGE, DEFAULT_INITIAL_RATING, DEFAULT_K_FACTOR};
use crate::elo::EloParams;

/// NFL playoff odds from Elo ratings and Monte Carlo bracket simulation
#[derive(Parser, Debug, Clone)]
#[command(name = "playoff-odds", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "playoffs.db", global = true)]
    pub database_path: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build end-of-regular-season Elo ratings
    Ratings(RatingsArgs),
    /// Simulate the playoff bracket
    Simulate(SimulateArgs),
    /// Show the stored per-game rating audit log
    Audit(AuditArgs),
    /// List stored simulation runs, or one run's odds table
    History(HistoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AuditArgs {
    /// NFL season year
    #[arg(long, env = "SEASON", default_value = "2025")]
    pub season: i32,

    /// Only games involving this team
    #[arg(long)]
    pub team: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// NFL season year
    #[arg(long, env = "SEASON", default_value = "2025")]
    pub season: i32,

    /// Number of runs to list
    #[arg(long, default_value = "10")]
    pub limit: i64,

    /// Print the odds table of this run instead of the run list
    #[arg(long)]
    pub run: Option<i64>,
}

#[derive(Args, Debug, Clone)]
pub struct RatingsArgs {
    /// NFL season year
    #[arg(long, env = "SEASON", default_value = "2025")]
    pub season: i32,

    /// Elo K-factor
    #[arg(long, env = "ELO_K", default_value_t = DEFAULT_K_FACTOR)]
    pub k: f64,

    /// Home-field advantage in Elo points
    #[arg(long, env = "ELO_HFA", default_value_t = DEFAULT_HOME_ADVANTAGE)]
    pub hfa: f64,

    /// Rating every team starts the season at
    #[arg(long, env = "ELO_INITIAL", default_value_t = DEFAULT_INITIAL_RATING)]
    pub initial_rating: f64,

    /// Read the schedule from a local nflverse-style games.csv instead of downloading it
    #[arg(long, env = "GAMES_CSV")]
    pub games_csv: Option<PathBuf>,

    /// Schedule download URL
    #[arg(long, env = "SCHEDULE_URL")]
    pub schedule_url: Option<String>,

    /// Output CSV for final ratings [default: data/elo_<season>.csv]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Optional CSV for the per-game rating audit log
    #[arg(long)]
    pub audit_out: Option<PathBuf>,
}

impl RatingsArgs {
    pub fn elo_params(&self) -> EloParams {
        EloParams {
            initial_rating: self.initial_rating,
            k_factor: self.k,
            home_advantage: self.hfa,
        }
    }

    pub fn out_path(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("data/elo_{}.csv", self.season)))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// NFL season year (selects stored ratings when --elo-csv is not given)
    #[arg(long, env = "SEASON", default_value = "2025")]
    pub season: i32,

    /// Rating table CSV (team,final_elo); defaults to the latest stored snapshot
    #[arg(long, env = "ELO_CSV")]
    pub elo_csv: Option<PathBuf>,

    /// Number of simulations; 1 prints the full bracket
    #[arg(long, default_value = "1")]
    pub sims: u64,

    /// Random seed for reproducibility [default: random]
    #[arg(long, env = "SIM_SEED")]
    pub seed: Option<u64>,

    /// Home-field advantage in Elo points
    #[arg(long, env = "ELO_HFA", default_value_t = DEFAULT_HOME_ADVANTAGE)]
    pub hfa: f64,

    /// Seeding JSON ({"AFC": {"1": "DEN", ...}, "NFC": {...}}) [default: built-in 2025 bracket]
    #[arg(long, env = "SEEDING_JSON")]
    pub seeding: Option<PathBuf>,

    /// Spread trials across all cores
    #[arg(long, env = "SIM_PARALLEL", default_value = "false")]
    pub parallel: bool,

    /// Output CSV for the odds table [default: results/playoff_odds_<season>.csv]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Rows of the odds table to print
    #[arg(long, default_value = "10")]
    pub top: usize,
}

impl SimulateArgs {
    pub fn out_path(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| {
            PathBuf::from(format!("results/playoff_odds_{}.csv", self.season))
        })
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Ratings(args) => {
                if !(args.k.is_finite() && args.k > 0.0) {
                    anyhow::bail!("k must be a positive number");
                }
                if !args.hfa.is_finite() {
                    anyhow::bail!("hfa must be a finite number");
                }
                if !args.initial_rating.is_finite() {
                    anyhow::bail!("initial_rating must be a finite number");
                }
            }
            Command::Simulate(args) => {
                if args.sims == 0 {
                    anyhow::bail!("sims must be at least 1");
                }
                if !args.hfa.is_finite() {
                    anyhow::bail!("hfa must be a finite number");
                }
            }
            Command::History(args) => {
                if args.limit <= 0 {
                    anyhow::bail!("limit must be positive");
                }
            }
            Command::Audit(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_defaults() {
        let config = Config::try_parse_from(["playoff-odds", "ratings"]).unwrap();
        config.validate().unwrap();
        let Command::Ratings(args) = config.command else {
            panic!("expected ratings subcommand");
        };
        assert_eq!(args.elo_params(), EloParams::default());
        assert_eq!(args.out_path(), PathBuf::from("data/elo_2025.csv"));
    }

    #[test]
    fn simulate_flags() {
        let config = Config::try_parse_from([
            "playoff-odds",
            "--database-path",
            "x.db",
            "simulate",
            "--sims",
            "10000",
            "--seed",
            "42",
            "--parallel",
        ])
        .unwrap();
        assert_eq!(config.database_path, "x.db");
        let Command::Simulate(args) = config.command else {
            panic!("expected simulate subcommand");
        };
        assert_eq!(args.sims, 10_000);
        assert_eq!(args.seed, Some(42));
        assert!(args.parallel);
        assert_eq!(args.out_path(), PathBuf::from("results/playoff_odds_2025.csv"));
    }

    #[test]
    fn rejects_zero_sims() {
        let config = Config::try_parse_from(["playoff-odds", "simulate", "--sims", "0"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn history_run_selection() {
        let config =
            Config::try_parse_from(["playoff-odds", "history", "--season", "2024", "--run", "3"]).unwrap();
        config.validate().unwrap();
        let Command::History(args) = config.command else {
            panic!("expected history subcommand");
        };
        assert_eq!(args.season, 2024);
        assert_eq!(args.run, Some(3));
    }

    #[test]
    fn rejects_non_positive_k() {
        let config = Config::try_parse_from(["playoff-odds", "ratings", "--k", "0"]).unwrap();
        assert!(config.validate().is_err());
    }
}
