use anyhow::Result;
use async_trait::async_trait;

use super::ScheduleRow;

/// Source of a season's schedule and results.
#[async_trait]
pub trait ScheduleProvider: Send + Sync {
    /// Every scheduled game of `season`, played or not.
    async fn fetch_season(&self, season: i32) -> Result<Vec<ScheduleRow>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
