//! Ingestion entry points: the inbound webhook and the scheduled trigger.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::Value;

use crate::application::ingest::{ScheduledOutcome, ScheduledTrigger};
use crate::domain::types::GenerationMode;

use super::error::ApiError;
use super::state::AppState;

/// `POST /api/webhook/posts` — one post payload or an array of them,
/// straight from the automation service.
pub async fn webhook_posts(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .ingest
        .ingest_webhook(payload, GenerationMode::Automatico)
        .await?;
    Ok(Json(report))
}

/// `POST /api/scheduled/generate` — gate-checked generation run. Schedule
/// rejections are well-formed responses, not errors.
pub async fn scheduled_generate(
    State(state): State<AppState>,
    Json(trigger): Json<ScheduledTrigger>,
) -> Result<impl IntoResponse, ApiError> {
    match state.ingest.ingest_scheduled(trigger).await {
        ScheduledOutcome::Completed(report) => Ok(Json(report).into_response()),
        ScheduledOutcome::Rejected(rejection) => Ok(Json(rejection).into_response()),
    }
}
