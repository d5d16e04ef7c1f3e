use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use std::sync::Arc;
use tracing::{info, warn};

use playoff_odds::config::{AuditArgs, Command, Config, HistoryArgs, RatingsArgs, SimulateArgs};
use playoff_odds::db::models::SimulationRun;
use playoff_odds::db::Database;
use playoff_odds::elo::compute_ratings;
use playoff_odds::playoffs::{BracketResolver, MonteCarlo, Seeding, SeedingFile};
use playoff_odds::report;
use playoff_odds::schedule::{
    completed_regular_season, LocalSchedule, NflverseSchedule, ScheduleProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    match &config.command {
        Command::Ratings(args) => build_ratings(args, &db).await,
        Command::Simulate(args) => simulate(args, &db),
        Command::Audit(args) => audit(args, &db),
        Command::History(args) => history(args, &db),
    }
}

async fn build_ratings(args: &RatingsArgs, db: &Database) -> Result<()> {
    let provider: Arc<dyn ScheduleProvider> = match &args.games_csv {
        Some(path) => Arc::new(LocalSchedule::new(path)),
        None => Arc::new(NflverseSchedule::new(args.schedule_url.as_deref())?),
    };
    info!("Loading {} schedule via {}", args.season, provider.name());

    let rows = provider.fetch_season(args.season).await?;
    let games = completed_regular_season(&rows);
    if games.is_empty() {
        anyhow::bail!("no completed regular-season games found for {}", args.season);
    }

    let params = args.elo_params();
    info!(
        "Updating Elo ratings (K={}, HFA={}, initial={})",
        params.k_factor, params.home_advantage, params.initial_rating
    );
    let run = compute_ratings(&games, &params)?;
    info!("Processed {} games for {} teams", run.audit.len(), run.ratings.len());

    let out = args.out_path();
    report::write_ratings_csv(&out, &run.ratings)?;
    info!("Saved {} team ratings to {}", run.ratings.len(), out.display());

    if let Some(audit_out) = &args.audit_out {
        report::write_audit_csv(audit_out, &run.audit)?;
        info!("Saved game-by-game audit log to {}", audit_out.display());
    }

    let snapshot_id = db.save_rating_run(args.season, &params, &run)?;
    info!("Stored rating snapshot #{}", snapshot_id);

    println!("{}", report::render_leaderboard(&run.ratings, 5));
    Ok(())
}

fn load_seeding(args: &SimulateArgs) -> Result<Seeding> {
    match &args.seeding {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read seeding {}", path.display()))?;
            let file: SeedingFile = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse seeding {}", path.display()))?;
            Ok(Seeding::from_file(&file)?)
        }
        None => Ok(Seeding::nfl_2025()),
    }
}

fn simulate(args: &SimulateArgs, db: &Database) -> Result<()> {
    let ratings = match &args.elo_csv {
        Some(path) => {
            info!("Loading Elo ratings from {}", path.display());
            report::read_ratings_csv(path)?
        }
        None => {
            let (snapshot_id, table) = db
                .latest_ratings(args.season)?
                .with_context(|| {
                    format!(
                        "no stored ratings for {}; run `ratings` first or pass --elo-csv",
                        args.season
                    )
                })?;
            info!("Using stored rating snapshot #{}", snapshot_id);
            table
        }
    };
    info!("Loaded Elo ratings for {} teams", ratings.len());

    let seeding = load_seeding(args)?;
    let resolver = BracketResolver::new(&seeding, &ratings, args.hfa)?;

    let seed = match args.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::thread_rng().gen();
            info!("No --seed given; using random seed {}", seed);
            seed
        }
    };
    let mc = MonteCarlo::new(resolver, seed);

    if args.sims == 1 {
        warn!("Single simulation: printing the full bracket, no odds table is written");
        let trial = mc.single_trial();
        println!("{}", report::render_trace(&trial.trace));
        println!("\nChampion: {}", trial.outcome.champion);
        return Ok(());
    }

    info!("Running {} playoff simulations (seed {})", args.sims, seed);
    let result = if args.parallel {
        mc.run_parallel(args.sims)?
    } else {
        mc.run(args.sims)?
    };
    let odds = result.probabilities();
    info!("Simulations complete");

    let out = args.out_path();
    report::write_odds_csv(&out, &odds)?;
    info!("Results saved to {}", out.display());

    let run = SimulationRun {
        id: None,
        season: args.season,
        trials: result.trials(),
        seed,
        home_advantage: args.hfa,
        created_at: chrono::Utc::now(),
    };
    let run_id = db.record_simulation(&run, &odds)?;
    info!("Stored simulation run #{}", run_id);

    println!("{}", report::render_odds_table(&odds, args.top));
    Ok(())
}

fn audit(args: &AuditArgs, db: &Database) -> Result<()> {
    let (snapshot_id, _) = db
        .latest_ratings(args.season)?
        .with_context(|| format!("no stored ratings for {}", args.season))?;
    let mut rows = db.list_audit(snapshot_id)?;
    if let Some(team) = &args.team {
        rows.retain(|r| r.home_team == *team || r.away_team == *team);
        if rows.is_empty() {
            warn!("No games for {} in snapshot #{}", team, snapshot_id);
        }
    }
    info!("Snapshot #{}: {} games", snapshot_id, rows.len());
    println!("{}", report::render_audit(&rows));
    Ok(())
}

fn history(args: &HistoryArgs, db: &Database) -> Result<()> {
    match args.run {
        Some(run_id) => {
            let odds = db.run_odds(run_id)?;
            if odds.is_empty() {
                anyhow::bail!("no stored odds for run #{}", run_id);
            }
            println!("{}", report::render_odds_table(&odds, odds.len()));
        }
        None => {
            let runs = db.list_runs(args.season, args.limit)?;
            if runs.is_empty() {
                warn!("No simulation runs stored for {}", args.season);
            }
            println!("{}", report::render_runs(&runs));
        }
    }
    Ok(())
}
