//! One randomized resolution of the playoff bracket.
//!
//! Stages run strictly in order, conference by conference:
//! wild card → divisional (reseeded) → conference championship, then the
//! Super Bowl at a neutral site. Every game draws exactly one uniform variate
//! from the injected RNG, so a seeded RNG replays the same bracket.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::elo::{win_probability, RatingTable};
use crate::error::{Result, SimError};

use super::seeding::{Conference, Seeding, SEEDS_PER_CONFERENCE};

/// Seed with a first-round bye
pub const BYE_SEED: u8 = 1;

/// Wild-card games as `(home seed, away seed)`
pub const WILD_CARD_PAIRINGS: [(u8, u8); 3] = [(2, 7), (3, 6), (4, 5)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Round {
    WildCard,
    Divisional,
    ConferenceChampionship,
    SuperBowl,
}

impl Round {
    pub const ALL: [Round; 4] = [
        Round::WildCard,
        Round::Divisional,
        Round::ConferenceChampionship,
        Round::SuperBowl,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Round::WildCard => "WILD CARD ROUND",
            Round::Divisional => "DIVISIONAL ROUND",
            Round::ConferenceChampionship => "CONFERENCE CHAMPIONSHIP",
            Round::SuperBowl => "SUPER BOWL",
        }
    }
}

/// Divisional-round games for four wild-card survivors, as
/// `(home seed, away seed)`.
///
/// The best remaining seed hosts the worst remaining seed; the middle two
/// play each other with the better seed at home.
pub fn divisional_pairings(mut seeds: [u8; 4]) -> [(u8, u8); 2] {
    seeds.sort_unstable();
    [(seeds[0], seeds[3]), (seeds[1], seeds[2])]
}

/// A seeded team with its rating resolved up front
#[derive(Debug, Clone, Copy, PartialEq)]
struct Entrant<'a> {
    team: &'a str,
    seed: u8,
    rating: f64,
}

/// A single resolved game, as reported to a [`GameObserver`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayedGame<'a> {
    pub round: Round,
    /// `None` for the Super Bowl
    pub conference: Option<Conference>,
    pub home: &'a str,
    pub home_seed: u8,
    pub away: &'a str,
    pub away_seed: u8,
    pub neutral: bool,
    pub p_home_win: f64,
    pub winner: &'a str,
}

/// Receives every game as it is resolved.
pub trait GameObserver {
    fn on_game(&mut self, game: &PlayedGame<'_>);
}

/// No-op observer used by aggregate runs
impl GameObserver for () {
    fn on_game(&mut self, _game: &PlayedGame<'_>) {}
}

/// Who reached each milestone in one trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialOutcome<'a> {
    /// Wild-card survivors, 4 per conference (seed 1 included)
    pub divisional: Vec<&'a str>,
    /// Divisional winners, 2 per conference
    pub conference_championship: Vec<&'a str>,
    /// Conference champions, AFC first
    pub super_bowl: Vec<&'a str>,
    pub champion: &'a str,
}

#[derive(Debug, Clone)]
struct ConferenceField<'a> {
    conference: Conference,
    /// `entrants[seed - 1]`
    entrants: Vec<Entrant<'a>>,
}

impl<'a> ConferenceField<'a> {
    fn by_seed(&self, seed: u8) -> Entrant<'a> {
        self.entrants[usize::from(seed) - 1]
    }
}

/// Resolves whole brackets against a frozen rating snapshot.
#[derive(Debug, Clone)]
pub struct BracketResolver<'a> {
    seeding: &'a Seeding,
    fields: Vec<ConferenceField<'a>>,
    home_advantage: f64,
}

impl<'a> BracketResolver<'a> {
    /// Resolve every seeded team's rating once. Fails if any seeded team is
    /// missing from `ratings`; no game is played in that case.
    pub fn new(seeding: &'a Seeding, ratings: &RatingTable, home_advantage: f64) -> Result<Self> {
        seeding.validate()?;
        let missing: Vec<&str> = seeding
            .entries()
            .map(|(_, _, team)| team)
            .filter(|team| !ratings.contains(team))
            .collect();
        if !missing.is_empty() {
            return Err(SimError::config(format!(
                "rating table has no entry for seeded team(s): {}",
                missing.join(", ")
            )));
        }

        let mut fields = Vec::with_capacity(Conference::ALL.len());
        for conference in Conference::ALL {
            let entrants = seeding
                .conference(conference)
                .iter()
                .map(|(seed, team)| {
                    Ok(Entrant {
                        team,
                        seed,
                        rating: ratings.require(team)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            if entrants.len() != SEEDS_PER_CONFERENCE {
                return Err(SimError::config(format!(
                    "{}: expected {} seeded teams, got {}",
                    conference,
                    SEEDS_PER_CONFERENCE,
                    entrants.len()
                )));
            }
            fields.push(ConferenceField { conference, entrants });
        }

        Ok(BracketResolver {
            seeding,
            fields,
            home_advantage,
        })
    }

    pub fn seeding(&self) -> &'a Seeding {
        self.seeding
    }

    pub fn home_advantage(&self) -> f64 {
        self.home_advantage
    }

    /// Play one full bracket.
    pub fn resolve<R, O>(&self, rng: &mut R, observer: &mut O) -> TrialOutcome<'a>
    where
        R: Rng,
        O: GameObserver + ?Sized,
    {
        let mut divisional = Vec::with_capacity(8);
        let mut conference_championship = Vec::with_capacity(4);
        let mut champions = Vec::with_capacity(2);

        for field in &self.fields {
            let survivors = self.wild_card(field, rng, observer);
            divisional.extend(survivors.iter().map(|e| e.team));

            let finalists = self.divisional(field, &survivors, rng, observer);
            conference_championship.extend(finalists.iter().map(|e| e.team));

            let champion = self.conference_championship(field, finalists, rng, observer);
            champions.push(champion);
        }

        let champion = self.super_bowl(champions[0], champions[1], rng, observer);

        TrialOutcome {
            divisional,
            conference_championship,
            super_bowl: champions.iter().map(|e| e.team).collect(),
            champion: champion.team,
        }
    }

    fn wild_card<R, O>(&self, field: &ConferenceField<'a>, rng: &mut R, observer: &mut O) -> Vec<Entrant<'a>>
    where
        R: Rng,
        O: GameObserver + ?Sized,
    {
        let mut survivors = Vec::with_capacity(4);
        survivors.push(field.by_seed(BYE_SEED));
        for (home, away) in WILD_CARD_PAIRINGS {
            let winner = self.play(
                Round::WildCard,
                Some(field.conference),
                field.by_seed(home),
                field.by_seed(away),
                false,
                rng,
                observer,
            );
            survivors.push(winner);
        }
        survivors
    }

    fn divisional<R, O>(
        &self,
        field: &ConferenceField<'a>,
        survivors: &[Entrant<'a>],
        rng: &mut R,
        observer: &mut O,
    ) -> [Entrant<'a>; 2]
    where
        R: Rng,
        O: GameObserver + ?Sized,
    {
        let seeds = [survivors[0].seed, survivors[1].seed, survivors[2].seed, survivors[3].seed];
        divisional_pairings(seeds).map(|(home, away)| {
            self.play(
                Round::Divisional,
                Some(field.conference),
                field.by_seed(home),
                field.by_seed(away),
                false,
                rng,
                observer,
            )
        })
    }

    fn conference_championship<R, O>(
        &self,
        field: &ConferenceField<'a>,
        finalists: [Entrant<'a>; 2],
        rng: &mut R,
        observer: &mut O,
    ) -> Entrant<'a>
    where
        R: Rng,
        O: GameObserver + ?Sized,
    {
        let [a, b] = finalists;
        let (home, away) = if a.seed <= b.seed { (a, b) } else { (b, a) };
        self.play(
            Round::ConferenceChampionship,
            Some(field.conference),
            home,
            away,
            false,
            rng,
            observer,
        )
    }

    fn super_bowl<R, O>(&self, afc: Entrant<'a>, nfc: Entrant<'a>, rng: &mut R, observer: &mut O) -> Entrant<'a>
    where
        R: Rng,
        O: GameObserver + ?Sized,
    {
        self.play(Round::SuperBowl, None, afc, nfc, true, rng, observer)
    }

    #[allow(clippy::too_many_arguments)]
    fn play<R, O>(
        &self,
        round: Round,
        conference: Option<Conference>,
        home: Entrant<'a>,
        away: Entrant<'a>,
        neutral: bool,
        rng: &mut R,
        observer: &mut O,
    ) -> Entrant<'a>
    where
        R: Rng,
        O: GameObserver + ?Sized,
    {
        let p_home_win = win_probability(home.rating, away.rating, self.home_advantage, neutral);
        let u: f64 = rng.gen();
        let winner = if u < p_home_win { home } else { away };

        observer.on_game(&PlayedGame {
            round,
            conference,
            home: home.team,
            home_seed: home.seed,
            away: away.team,
            away_seed: away.seed,
            neutral,
            p_home_win,
            winner: winner.team,
        });

        winner
    }
}
