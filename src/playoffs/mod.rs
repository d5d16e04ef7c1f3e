pub mod bracket;
pub mod monte_carlo;
pub mod seeding;
pub mod trace;

pub use bracket::{BracketResolver, GameObserver, PlayedGame, Round, TrialOutcome};
pub use monte_carlo::{AggregateResult, MilestoneCounts, MonteCarlo, SingleTrial};
pub use seeding::{Conference, ConferenceSeeds, Seeding, SeedingFile};
pub use trace::{BracketTrace, TracedGame};
