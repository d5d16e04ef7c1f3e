pub mod ratings;
pub mod win_probability;

pub use ratings::{compute_ratings, EloParams, RatingRun, RatingTable};
pub use win_probability::win_probability;
