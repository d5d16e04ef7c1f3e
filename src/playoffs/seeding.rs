use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{Result, SimError};

/// Playoff teams per conference
pub const SEEDS_PER_CONFERENCE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conference {
    #[serde(rename = "AFC")]
    Afc,
    #[serde(rename = "NFC")]
    Nfc,
}

impl Conference {
    /// Resolution order; the first conference's champion is the nominal
    /// Super Bowl home team.
    pub const ALL: [Conference; 2] = [Conference::Afc, Conference::Nfc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Conference::Afc => "AFC",
            Conference::Nfc => "NFC",
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seeds 1..=7 of one conference; `teams[0]` holds seed 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConferenceSeeds {
    conference: Conference,
    teams: Vec<String>,
}

impl ConferenceSeeds {
    /// Build from a seed → team map. Every seed in 1..=7 must be present
    /// exactly once and no team may hold two seeds.
    pub fn new(conference: Conference, seeds: &BTreeMap<u8, String>) -> Result<Self> {
        if let Some(bad) = seeds
            .keys()
            .find(|&&s| s == 0 || s as usize > SEEDS_PER_CONFERENCE)
        {
            return Err(SimError::config(format!(
                "{}: seed {} is outside 1..={}",
                conference, bad, SEEDS_PER_CONFERENCE
            )));
        }
        let missing: Vec<String> = (1..=SEEDS_PER_CONFERENCE as u8)
            .filter(|s| !seeds.contains_key(s))
            .map(|s| s.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SimError::config(format!(
                "{}: missing seed(s) {}",
                conference,
                missing.join(", ")
            )));
        }

        let seeds = ConferenceSeeds {
            conference,
            teams: seeds.values().cloned().collect(),
        };
        seeds.validate()?;
        Ok(seeds)
    }

    /// Build from teams listed best seed first.
    pub fn from_ordered<S: AsRef<str>>(conference: Conference, teams: &[S]) -> Result<Self> {
        let seeds = ConferenceSeeds {
            conference,
            teams: teams.iter().map(|t| t.as_ref().to_string()).collect(),
        };
        seeds.validate()?;
        Ok(seeds)
    }

    fn validate(&self) -> Result<()> {
        if self.teams.len() != SEEDS_PER_CONFERENCE {
            return Err(SimError::config(format!(
                "{}: expected {} seeded teams, got {}",
                self.conference,
                SEEDS_PER_CONFERENCE,
                self.teams.len()
            )));
        }
        let mut seen = HashSet::new();
        for (idx, team) in self.teams.iter().enumerate() {
            if team.trim().is_empty() {
                return Err(SimError::config(format!(
                    "{}: seed {} has an empty team name",
                    self.conference,
                    idx + 1
                )));
            }
            if !seen.insert(team.as_str()) {
                return Err(SimError::config(format!(
                    "{}: team '{}' holds more than one seed",
                    self.conference, team
                )));
            }
        }
        Ok(())
    }

    pub fn conference(&self) -> Conference {
        self.conference
    }

    /// Team holding `seed`, if the seed is in range
    pub fn team(&self, seed: u8) -> Option<&str> {
        let idx = usize::from(seed).checked_sub(1)?;
        self.teams.get(idx).map(String::as_str)
    }

    pub fn seed_of(&self, team: &str) -> Option<u8> {
        self.teams
            .iter()
            .position(|t| t == team)
            .map(|idx| idx as u8 + 1)
    }

    /// `(seed, team)` pairs, best seed first
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.teams
            .iter()
            .enumerate()
            .map(|(idx, team)| (idx as u8 + 1, team.as_str()))
    }
}

/// Both conferences' seeds. Immutable for the duration of a run.
///
/// (De)serializes through the [`SeedingFile`] layout, so a deserialized
/// seeding has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeedingFile", into = "SeedingFile")]
pub struct Seeding {
    afc: ConferenceSeeds,
    nfc: ConferenceSeeds,
}

/// On-disk seeding layout: `{"AFC": {"1": "DEN", ...}, "NFC": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedingFile {
    #[serde(rename = "AFC")]
    pub afc: BTreeMap<u8, String>,
    #[serde(rename = "NFC")]
    pub nfc: BTreeMap<u8, String>,
}

impl Seeding {
    pub fn new(afc: ConferenceSeeds, nfc: ConferenceSeeds) -> Result<Self> {
        let seeding = Seeding { afc, nfc };
        seeding.validate()?;
        Ok(seeding)
    }

    pub fn from_file(file: &SeedingFile) -> Result<Self> {
        Seeding::new(
            ConferenceSeeds::new(Conference::Afc, &file.afc)?,
            ConferenceSeeds::new(Conference::Nfc, &file.nfc)?,
        )
    }

    /// The 2025 bracket. Team codes follow nflverse (`LA` is the Rams).
    pub fn nfl_2025() -> Self {
        let conf = |conference, teams: [&str; SEEDS_PER_CONFERENCE]| ConferenceSeeds {
            conference,
            teams: teams.iter().map(|t| t.to_string()).collect(),
        };
        Seeding {
            afc: conf(Conference::Afc, ["DEN", "NE", "JAX", "PIT", "HOU", "BUF", "LAC"]),
            nfc: conf(Conference::Nfc, ["SEA", "CHI", "PHI", "CAR", "LA", "SF", "GB"]),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for seeds in [&self.afc, &self.nfc] {
            seeds.validate()?;
        }
        if self.afc.conference != Conference::Afc || self.nfc.conference != Conference::Nfc {
            return Err(SimError::config("conference seeds assigned to the wrong conference"));
        }
        if let Some(shared) = self.afc.teams.iter().find(|t| self.nfc.teams.contains(t)) {
            return Err(SimError::config(format!(
                "team '{}' is seeded in both conferences",
                shared
            )));
        }
        Ok(())
    }

    pub fn conference(&self, conference: Conference) -> &ConferenceSeeds {
        match conference {
            Conference::Afc => &self.afc,
            Conference::Nfc => &self.nfc,
        }
    }

    /// Every seeded team as `(conference, seed, team)`
    pub fn entries(&self) -> impl Iterator<Item = (Conference, u8, &str)> {
        Conference::ALL.into_iter().flat_map(move |conference| {
            self.conference(conference)
                .iter()
                .map(move |(seed, team)| (conference, seed, team))
        })
    }

    pub fn to_file(&self) -> SeedingFile {
        let map = |seeds: &ConferenceSeeds| {
            seeds
                .iter()
                .map(|(seed, team)| (seed, team.to_string()))
                .collect()
        };
        SeedingFile {
            afc: map(&self.afc),
            nfc: map(&self.nfc),
        }
    }
}

impl TryFrom<SeedingFile> for Seeding {
    type Error = SimError;

    fn try_from(file: SeedingFile) -> Result<Self> {
        Seeding::from_file(&file)
    }
}

impl From<Seeding> for SeedingFile {
    fn from(seeding: Seeding) -> Self {
        seeding.to_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_map(teams: &[&str]) -> BTreeMap<u8, String> {
        teams
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u8 + 1, t.to_string()))
            .collect()
    }

    #[test]
    fn builtin_bracket_is_valid() {
        let seeding = Seeding::nfl_2025();
        assert!(seeding.validate().is_ok());
        assert_eq!(seeding.entries().count(), 14);
        assert_eq!(seeding.conference(Conference::Afc).team(1), Some("DEN"));
        assert_eq!(seeding.conference(Conference::Nfc).team(5), Some("LA"));
        assert_eq!(seeding.conference(Conference::Nfc).seed_of("GB"), Some(7));
    }

    #[test]
    fn team_lookup_out_of_range() {
        let seeding = Seeding::nfl_2025();
        let afc = seeding.conference(Conference::Afc);
        assert_eq!(afc.team(0), None);
        assert_eq!(afc.team(8), None);
        assert_eq!(afc.seed_of("SEA"), None);
    }

    #[test]
    fn rejects_missing_seed() {
        let mut seeds = seed_map(&["A", "B", "C", "D", "E", "F", "G"]);
        seeds.remove(&4);
        let err = ConferenceSeeds::new(Conference::Afc, &seeds).unwrap_err();
        assert!(matches!(err, SimError::Configuration(ref m) if m.contains("missing seed")));
    }

    #[test]
    fn rejects_out_of_range_seed() {
        let mut seeds = seed_map(&["A", "B", "C", "D", "E", "F", "G"]);
        seeds.insert(8, "H".into());
        assert!(ConferenceSeeds::new(Conference::Afc, &seeds).is_err());
    }

    #[test]
    fn rejects_duplicate_team() {
        let seeds = seed_map(&["A", "B", "C", "D", "E", "F", "A"]);
        let err = ConferenceSeeds::new(Conference::Afc, &seeds).unwrap_err();
        assert!(matches!(err, SimError::Configuration(ref m) if m.contains("more than one seed")));
    }

    #[test]
    fn rejects_wrong_team_count() {
        assert!(ConferenceSeeds::from_ordered(Conference::Nfc, &["A", "B", "C"]).is_err());
    }

    #[test]
    fn rejects_team_in_both_conferences() {
        let afc = ConferenceSeeds::from_ordered(Conference::Afc, &["A", "B", "C", "D", "E", "F", "G"]).unwrap();
        let nfc = ConferenceSeeds::from_ordered(Conference::Nfc, &["H", "I", "J", "K", "L", "M", "A"]).unwrap();
        assert!(Seeding::new(afc, nfc).is_err());
    }

    #[test]
    fn rejects_swapped_conferences() {
        let afc = ConferenceSeeds::from_ordered(Conference::Afc, &["A", "B", "C", "D", "E", "F", "G"]).unwrap();
        let nfc = ConferenceSeeds::from_ordered(Conference::Nfc, &["H", "I", "J", "K", "L", "M", "N"]).unwrap();
        assert!(Seeding::new(nfc, afc).is_err());
    }

    #[test]
    fn parses_json_layout() {
        let json = r#"{
            "AFC": {"1": "DEN", "2": "NE", "3": "JAX", "4": "PIT", "5": "HOU", "6": "BUF", "7": "LAC"},
            "NFC": {"1": "SEA", "2": "CHI", "3": "PHI", "4": "CAR", "5": "LA", "6": "SF", "7": "GB"}
        }"#;
        let file: SeedingFile = serde_json::from_str(json).unwrap();
        let seeding = Seeding::from_file(&file).unwrap();
        assert_eq!(seeding, Seeding::nfl_2025());
        assert_eq!(seeding.to_file().afc, file.afc);
    }

    #[test]
    fn deserializing_runs_validation() {
        let short = r#"{"AFC": {"1": "DEN", "2": "NE", "3": "JAX"},
                        "NFC": {"1": "SEA", "2": "CHI", "3": "PHI", "4": "CAR", "5": "LA", "6": "SF", "7": "GB"}}"#;
        assert!(serde_json::from_str::<Seeding>(short).is_err());

        let duplicate = r#"{"AFC": {"1": "DEN", "2": "NE", "3": "JAX", "4": "PIT", "5": "HOU", "6": "BUF", "7": "LAC"},
                            "NFC": {"1": "SEA", "2": "SEA", "3": "PHI", "4": "CAR", "5": "LA", "6": "SF", "7": "GB"}}"#;
        let err = serde_json::from_str::<Seeding>(duplicate).unwrap_err();
        assert!(err.to_string().contains("more than one seed"), "{}", err);
    }

    #[test]
    fn serializes_in_file_layout() {
        let json = serde_json::to_string(&Seeding::nfl_2025()).unwrap();
        assert!(json.starts_with(r#"{"AFC":{"1":"DEN""#), "{}", json);
        let back: Seeding = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Seeding::nfl_2025());
    }
}
