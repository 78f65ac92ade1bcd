use std::sync::Arc;

use crate::application::ingest::IngestService;
use crate::application::repos::{ImageStorage, PostsRepo, PostsWriteRepo};
use crate::application::schedule::ScheduleService;

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostsRepo>,
    pub posts_write: Arc<dyn PostsWriteRepo>,
    pub images: Arc<dyn ImageStorage>,
    pub ingest: Arc<IngestService>,
    pub schedule: Arc<ScheduleService>,
    /// Bearer token guarding the admin routes. Absent in local development,
    /// which leaves those routes open.
    pub admin_token: Option<Arc<str>>,
}
