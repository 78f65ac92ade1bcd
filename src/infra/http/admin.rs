//! Privileged admin surface: full post listing, field-level edits, deletes,
//! and image uploads.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::application::repos::PostPatch;
use crate::infra::store::post_to_row;

use super::error::ApiError;
use super::state::AppState;

/// All posts regardless of status; the only read path that sees drafts.
pub async fn list_all_posts(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.list_all().await?;
    let rows: Vec<Value> = posts
        .iter()
        .map(|post| Value::Object(post_to_row(post)))
        .collect();
    Ok(Json(rows))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<PostPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts_write.update_post(id, patch).await?;
    info!(target = "canastra::http", id, slug = %post.slug, "post updated");
    Ok(Json(Value::Object(post_to_row(&post))))
}

/// Destructive and permanent; the caller confirms intent before calling.
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.posts_write.delete_post(id).await?;
    if deleted {
        info!(target = "canastra::http", id, "post deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("post not found"))
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// First half of the image replacement flow: the binary goes to object
/// storage, and the returned URL belongs in a subsequent post patch.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request("invalid multipart body", Some(err.to_string())))?
        .ok_or_else(|| ApiError::bad_request("multipart body carries no file", None))?;

    let content_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("file field is missing a content type", None))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|err| ApiError::bad_request("failed to read file field", Some(err.to_string())))?;

    let url = state
        .images
        .upload_image(&content_type, bytes.to_vec())
        .await?;

    Ok(Json(UploadResponse { url }))
}
