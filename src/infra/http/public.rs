//! Public read surface for the marketing site.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::entities::PostSummary;
use crate::infra::store::post_to_row;

use super::error::ApiError;
use super::state::AppState;

const DEFAULT_RECENT_LIMIT: u32 = 5;
const MAX_RECENT_LIMIT: u32 = 50;

pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.list_published().await?;
    let rows: Vec<Value> = posts
        .iter()
        .map(|post| Value::Object(post_to_row(post)))
        .collect();
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

pub async fn list_recent_posts(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<PostSummary>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    let summaries = state.posts.list_recent(limit).await?;
    Ok(Json(summaries))
}

pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.find_by_slug(&slug, true).await?;

    match post {
        Some(post) => Ok(Json(Value::Object(post_to_row(&post)))),
        None => Err(ApiError::not_found("post not found")),
    }
}
