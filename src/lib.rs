//! Playoff odds for the NFL bracket.
//!
//! Regular-season results are folded into Elo ratings ([`elo`]); the frozen
//! ratings then drive repeated randomized resolutions of the 14-team bracket
//! ([`playoffs`]) to estimate how far each team goes.

pub mod config;
pub mod db;
pub mod elo;
pub mod error;
pub mod playoffs;
pub mod report;
pub mod schedule;

pub use config::Config;
pub use db::Database;
pub use elo::{compute_ratings, win_probability, EloParams, RatingRun, RatingTable};
pub use error::{Result, SimError};
pub use playoffs::{AggregateResult, BracketResolver, MonteCarlo, Seeding};
