use async_trait::async_trait;

use crate::application::repos::{RepoError, ScheduleRepo};
use crate::domain::schedule::ScheduleConfig;

use super::rows::{config_to_row, row_to_config};
use super::{RestStore, SCHEDULE_TABLE};

#[async_trait]
impl ScheduleRepo for RestStore {
    async fn load_latest(&self) -> Result<Option<ScheduleConfig>, RepoError> {
        let Some(backend) = self.backend("load_schedule_config") else {
            return Ok(None);
        };

        let query = vec![
            ("order", "updated_at.desc".to_string()),
            ("limit", "1".to_string()),
        ];
        let mut rows = backend.select(SCHEDULE_TABLE, &query).await?;
        rows.pop().map(|row| row_to_config(&row)).transpose()
    }

    async fn save(&self, config: &ScheduleConfig) -> Result<(), RepoError> {
        let Some(backend) = self.backend("save_schedule_config") else {
            return Err(RepoError::Unconfigured);
        };

        backend
            .insert(SCHEDULE_TABLE, &config_to_row(config))
            .await?;
        Ok(())
    }
}
