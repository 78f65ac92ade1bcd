//! Repository traits describing the persistence seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{NewPost, PostRecord, PostSummary};
use crate::domain::schedule::ScheduleConfig;
use crate::domain::types::{PostStatus, PostType};

#[derive(Debug, Error)]
pub enum RepoError {
    /// The backing store has no credentials configured. Reads degrade to
    /// empty results before reaching this; writes surface it.
    #[error("backing store is not configured")]
    Unconfigured,
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Field-level patch applied by the admin edit path. Only named fields
/// change; the store refreshes `updated_at` on every patch. Image
/// replacement is caller-driven: the binary goes to object storage first and
/// the resulting URL arrives here.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PostPatch {
    pub titulo: Option<String>,
    pub resumo: Option<String>,
    pub conclusao: Option<String>,
    pub status: Option<PostStatus>,
    pub post_type: Option<PostType>,
    pub imagem_principal: Option<String>,
    pub imagem_principal_alt: Option<String>,
    pub fonte: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none()
            && self.resumo.is_none()
            && self.conclusao.is_none()
            && self.status.is_none()
            && self.post_type.is_none()
            && self.imagem_principal.is_none()
            && self.imagem_principal_alt.is_none()
            && self.fonte.is_none()
            && self.meta_description.is_none()
            && self.meta_keywords.is_none()
    }
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Exact-match lookup. With `require_published`, drafts are invisible.
    async fn find_by_slug(
        &self,
        slug: &str,
        require_published: bool,
    ) -> Result<Option<PostRecord>, RepoError>;

    /// Published posts, newest first.
    async fn list_published(&self) -> Result<Vec<PostRecord>, RepoError>;

    /// Published posts projected to the summary subset, newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError>;

    /// Every post regardless of status. Admin-only surface.
    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<PostRecord, RepoError>;

    /// Returns whether a record was removed. No soft-delete.
    async fn delete_post(&self, id: i64) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store an image binary and return its public URL. First half of the
    /// two-step image replacement flow.
    async fn upload_image(&self, content_type: &str, bytes: Vec<u8>)
    -> Result<String, RepoError>;
}

#[async_trait]
pub trait ScheduleRepo: Send + Sync {
    /// Most recently updated config row, if any.
    async fn load_latest(&self) -> Result<Option<ScheduleConfig>, RepoError>;

    /// Append a new config row; the latest `updated_at` wins on read.
    async fn save(&self, config: &ScheduleConfig) -> Result<(), RepoError>;
}
