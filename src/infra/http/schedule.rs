//! Schedule-config CRUD surface.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;

use crate::application::schedule::ScheduleConfigPatch;
use crate::domain::schedule::ScheduleConfig;
use crate::domain::types::GenerationMode;

use super::error::ApiError;
use super::state::AppState;

/// Full-replacement body for `PUT /api/schedule-config`. Validated
/// field-by-field before any write.
#[derive(Debug, Deserialize)]
pub struct ScheduleConfigInput {
    pub is_enabled: bool,
    pub start_hour: u8,
    pub end_hour: u8,
    pub modo: GenerationMode,
    pub tema: Option<String>,
    pub publico_alvo: Option<String>,
}

pub async fn get_config(State(state): State<AppState>) -> Json<ScheduleConfig> {
    Json(state.schedule.load().await)
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(input): Json<ScheduleConfigInput>,
) -> Result<Json<ScheduleConfig>, ApiError> {
    let config = ScheduleConfig {
        is_enabled: input.is_enabled,
        start_hour: input.start_hour,
        end_hour: input.end_hour,
        modo: input.modo,
        tema: input.tema,
        publico_alvo: input.publico_alvo,
        updated_at: Utc::now(),
    };

    let saved = state.schedule.save(config).await?;
    Ok(Json(saved))
}

pub async fn patch_config(
    State(state): State<AppState>,
    Json(patch): Json<ScheduleConfigPatch>,
) -> Result<Json<ScheduleConfig>, ApiError> {
    let updated = state.schedule.update(patch).await?;
    Ok(Json(updated))
}
