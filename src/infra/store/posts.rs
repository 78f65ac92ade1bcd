use async_trait::async_trait;
use chrono::Utc;

use crate::application::repos::{PostPatch, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::entities::{NewPost, PostRecord, PostSummary};
use crate::domain::types::PostStatus;

use super::rows::{new_post_to_row, patch_to_row, row_to_post, row_to_summary};
use super::{POSTS_TABLE, RestStore};

fn published_filter() -> (&'static str, String) {
    ("status", format!("eq.{}", PostStatus::Publicado.as_str()))
}

#[async_trait]
impl PostsRepo for RestStore {
    async fn find_by_slug(
        &self,
        slug: &str,
        require_published: bool,
    ) -> Result<Option<PostRecord>, RepoError> {
        let Some(backend) = self.backend("find_by_slug") else {
            return Ok(None);
        };

        let mut query = vec![("slug", format!("eq.{slug}")), ("limit", "1".to_string())];
        if require_published {
            query.push(published_filter());
        }

        let mut rows = backend.select(POSTS_TABLE, &query).await?;
        rows.pop().map(|row| row_to_post(&row)).transpose()
    }

    async fn list_published(&self) -> Result<Vec<PostRecord>, RepoError> {
        let Some(backend) = self.backend("list_published") else {
            return Ok(Vec::new());
        };

        let query = vec![
            published_filter(),
            ("order", "created_at.desc".to_string()),
        ];
        let rows = backend.select(POSTS_TABLE, &query).await?;
        rows.iter().map(row_to_post).collect()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError> {
        let Some(backend) = self.backend("list_recent") else {
            return Ok(Vec::new());
        };

        let query = vec![
            published_filter(),
            ("select", "id,titulo,slug,created_at".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.max(1).to_string()),
        ];
        let rows = backend.select(POSTS_TABLE, &query).await?;
        rows.iter().map(row_to_summary).collect()
    }

    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let Some(backend) = self.backend("list_all") else {
            return Ok(Vec::new());
        };

        let query = vec![("order", "created_at.desc".to_string())];
        let rows = backend.select(POSTS_TABLE, &query).await?;
        rows.iter().map(row_to_post).collect()
    }
}

#[async_trait]
impl PostsWriteRepo for RestStore {
    async fn insert_post(&self, post: NewPost) -> Result<PostRecord, RepoError> {
        let Some(backend) = self.backend("insert_post") else {
            return Err(RepoError::Unconfigured);
        };

        let row = backend.insert(POSTS_TABLE, &new_post_to_row(&post)).await?;
        row_to_post(&row)
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<PostRecord, RepoError> {
        if patch.is_empty() {
            return Err(RepoError::invalid_input("patch names no fields"));
        }
        let Some(backend) = self.backend("update_post") else {
            return Err(RepoError::Unconfigured);
        };

        let body = patch_to_row(&patch, Utc::now());
        match backend.update_by_id(POSTS_TABLE, id, &body).await? {
            Some(row) => row_to_post(&row),
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete_post(&self, id: i64) -> Result<bool, RepoError> {
        let Some(backend) = self.backend("delete_post") else {
            return Ok(false);
        };

        backend.delete_by_id(POSTS_TABLE, id).await
    }
}
