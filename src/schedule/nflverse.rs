use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tracing::{debug, info};

use super::provider::ScheduleProvider;
use super::{parse_schedule_csv, ScheduleRow};

const NFLVERSE_GAMES_URL: &str =
    "https://raw.githubusercontent.com/nflverse/nfldata/master/data/games.csv";

/// Schedule provider backed by the nflverse `games.csv` dump.
/// Docs: <https://github.com/nflverse/nfldata/blob/master/DATA_DICTIONARY.md>
pub struct NflverseSchedule {
    http: Client,
    /// Overridable for tests and mirrors
    url: String,
}

impl NflverseSchedule {
    pub fn new(url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(NflverseSchedule {
            http,
            url: url.unwrap_or(NFLVERSE_GAMES_URL).to_string(),
        })
    }
}

#[async_trait]
impl ScheduleProvider for NflverseSchedule {
    fn name(&self) -> &str {
        "nflverse"
    }

    async fn fetch_season(&self, season: i32) -> Result<Vec<ScheduleRow>> {
        debug!("Fetching schedule from {}", self.url);

        let resp = self.http.get(&self.url).send().await
            .context("nflverse schedule request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("nflverse error: {}", resp.status());
        }

        let body = resp.text().await
            .context("Failed to read nflverse schedule body")?;

        let rows: Vec<ScheduleRow> = parse_schedule_csv(body.as_bytes())?
            .into_iter()
            .filter(|row| row.season == season)
            .collect();
        info!("Loaded {} scheduled games for {} from nflverse", rows.len(), season);
        Ok(rows)
    }
}

/// Reads a schedule in the nflverse `games.csv` layout from disk.
pub struct LocalSchedule {
    path: PathBuf,
}

impl LocalSchedule {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LocalSchedule { path: path.into() }
    }
}

#[async_trait]
impl ScheduleProvider for LocalSchedule {
    fn name(&self) -> &str {
        "local-csv"
    }

    async fn fetch_season(&self, season: i32) -> Result<Vec<ScheduleRow>> {
        let body = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read schedule {}", self.path.display()))?;
        let rows: Vec<ScheduleRow> = parse_schedule_csv(body.as_slice())?
            .into_iter()
            .filter(|row| row.season == season)
            .collect();
        info!(
            "Loaded {} scheduled games for {} from {}",
            rows.len(),
            season,
            self.path.display()
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn local_schedule_filters_season() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "game_id,season,game_type,week,gameday,away_team,away_score,home_team,home_score\n\
             2024_01_BAL_KC,2024,REG,1,2024-09-05,BAL,20,KC,27\n\
             2025_01_DAL_PHI,2025,REG,1,2025-09-04,DAL,20,PHI,24\n"
        )
        .unwrap();

        let provider = LocalSchedule::new(file.path());
        let rows = provider.fetch_season(2025).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].home_team, "PHI");
        assert_eq!(provider.name(), "local-csv");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let provider = LocalSchedule::new("/nonexistent/games.csv");
        assert!(provider.fetch_season(2025).await.is_err());
    }
}
