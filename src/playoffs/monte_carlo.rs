//! Repeated bracket resolution and milestone counting.
//!
//! Trial `i` of a run draws from its own `StdRng` derived from the run seed
//! and `i`, so the sequential and the rayon runner produce identical tables
//! and any single trial can be replayed in isolation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::models::TeamOdds;
use crate::error::{Result, SimError};

use super::bracket::{BracketResolver, TrialOutcome};
use super::seeding::{Conference, Seeding};
use super::trace::BracketTrace;

/// Trials between progress log lines
const PROGRESS_EVERY: u64 = 1000;

/// Independent RNG for one trial of a run
pub fn trial_rng(seed: u64, trial: u64) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(trial.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

/// How often a team reached each milestone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MilestoneCounts {
    pub divisional: u64,
    pub conf_champ: u64,
    pub super_bowl: u64,
    pub champion: u64,
}

impl MilestoneCounts {
    fn add(&mut self, other: &MilestoneCounts) {
        self.divisional += other.divisional;
        self.conf_champ += other.conf_champ;
        self.super_bowl += other.super_bowl;
        self.champion += other.champion;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TeamTally {
    conference: Conference,
    seed: u8,
    counts: MilestoneCounts,
}

/// Milestone counters for every seeded team.
///
/// The key set is fixed from the seeding at construction: a team that never
/// advanced still has an all-zero row, and recording a team outside the
/// bracket is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    trials: u64,
    tallies: BTreeMap<String, TeamTally>,
}

impl AggregateResult {
    pub fn new(seeding: &Seeding) -> Self {
        let tallies = seeding
            .entries()
            .map(|(conference, seed, team)| {
                (
                    team.to_string(),
                    TeamTally {
                        conference,
                        seed,
                        counts: MilestoneCounts::default(),
                    },
                )
            })
            .collect();
        AggregateResult { trials: 0, tallies }
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn counts(&self, team: &str) -> Option<MilestoneCounts> {
        self.tallies.get(team).map(|t| t.counts)
    }

    fn tally(&mut self, team: &str) -> Result<&mut MilestoneCounts> {
        self.tallies
            .get_mut(team)
            .map(|t| &mut t.counts)
            .ok_or_else(|| SimError::config(format!("team '{}' is not in the bracket", team)))
    }

    fn check_known<'t>(&self, mut teams: impl Iterator<Item = &'t str>) -> Result<()> {
        match teams.find(|team| !self.tallies.contains_key(*team)) {
            Some(team) => Err(SimError::config(format!("team '{}' is not in the bracket", team))),
            None => Ok(()),
        }
    }

    /// Count one trial. Nothing is counted if any team is outside the bracket.
    pub fn record(&mut self, outcome: &TrialOutcome<'_>) -> Result<()> {
        self.check_known(
            outcome
                .divisional
                .iter()
                .chain(&outcome.conference_championship)
                .chain(&outcome.super_bowl)
                .copied()
                .chain(std::iter::once(outcome.champion)),
        )?;
        for team in &outcome.divisional {
            self.tally(team)?.divisional += 1;
        }
        for team in &outcome.conference_championship {
            self.tally(team)?.conf_champ += 1;
        }
        for team in &outcome.super_bowl {
            self.tally(team)?.super_bowl += 1;
        }
        self.tally(outcome.champion)?.champion += 1;
        self.trials += 1;
        Ok(())
    }

    /// Fold another partial result over the same bracket into this one
    pub fn merge(&mut self, other: &AggregateResult) -> Result<()> {
        self.check_known(other.tallies.keys().map(String::as_str))?;
        for (team, tally) in &other.tallies {
            self.tally(team)?.add(&tally.counts);
        }
        self.trials += other.trials;
        Ok(())
    }

    /// Counts as probabilities, most likely champion first
    pub fn probabilities(&self) -> Vec<TeamOdds> {
        let n = self.trials.max(1) as f64;
        let mut odds: Vec<TeamOdds> = self
            .tallies
            .iter()
            .map(|(team, tally)| TeamOdds {
                team: team.clone(),
                conference: tally.conference.to_string(),
                seed: tally.seed,
                pct_make_divisional: tally.counts.divisional as f64 / n,
                pct_make_conf_champ: tally.counts.conf_champ as f64 / n,
                pct_make_superbowl: tally.counts.super_bowl as f64 / n,
                pct_win_superbowl: tally.counts.champion as f64 / n,
            })
            .collect();
        odds.sort_by(|a, b| {
            b.pct_win_superbowl
                .total_cmp(&a.pct_win_superbowl)
                .then_with(|| b.pct_make_superbowl.total_cmp(&a.pct_make_superbowl))
                .then_with(|| a.team.cmp(&b.team))
        });
        odds
    }
}

/// A single traced trial
#[derive(Debug, Clone, PartialEq)]
pub struct SingleTrial<'a> {
    pub trace: BracketTrace,
    pub outcome: TrialOutcome<'a>,
}

/// Drives a [`BracketResolver`] over many seeded trials.
pub struct MonteCarlo<'a> {
    resolver: BracketResolver<'a>,
    seed: u64,
}

impl<'a> MonteCarlo<'a> {
    pub fn new(resolver: BracketResolver<'a>, seed: u64) -> Self {
        Self { resolver, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn check_trials(trials: u64) -> Result<()> {
        if trials == 0 {
            return Err(SimError::config("trial count must be positive"));
        }
        Ok(())
    }

    /// Run `trials` brackets one after another.
    pub fn run(&self, trials: u64) -> Result<AggregateResult> {
        Self::check_trials(trials)?;
        let mut result = AggregateResult::new(self.resolver.seeding());
        for trial in 0..trials {
            let mut rng = trial_rng(self.seed, trial);
            let outcome = self.resolver.resolve(&mut rng, &mut ());
            result.record(&outcome)?;
            if (trial + 1) % PROGRESS_EVERY == 0 {
                debug!("Completed {}/{} simulations", trial + 1, trials);
            }
        }
        Ok(result)
    }

    /// Same as [`MonteCarlo::run`], spread over the rayon thread pool.
    pub fn run_parallel(&self, trials: u64) -> Result<AggregateResult> {
        Self::check_trials(trials)?;
        let seeding = self.resolver.seeding();
        (0..trials)
            .into_par_iter()
            .try_fold(
                || AggregateResult::new(seeding),
                |mut acc: AggregateResult, trial| -> Result<AggregateResult> {
                    let mut rng = trial_rng(self.seed, trial);
                    let outcome = self.resolver.resolve(&mut rng, &mut ());
                    acc.record(&outcome)?;
                    Ok(acc)
                },
            )
            .try_reduce(
                || AggregateResult::new(seeding),
                |mut left: AggregateResult, right: AggregateResult| -> Result<AggregateResult> {
                    left.merge(&right)?;
                    Ok(left)
                },
            )
    }

    /// Replay trial 0 of this run with full play-by-play.
    pub fn single_trial(&self) -> SingleTrial<'a> {
        let mut rng = trial_rng(self.seed, 0);
        let mut trace = BracketTrace::default();
        let outcome = self.resolver.resolve(&mut rng, &mut trace);
        SingleTrial { trace, outcome }
    }
}
