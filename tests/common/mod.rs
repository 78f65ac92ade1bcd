//! In-memory test doubles for the repository and generator seams.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI64, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use serde_json::Value;

use canastra::application::ingest::{
    ContentGenerator, GeneratorError, GeneratorRequest, IngestService,
};
use canastra::application::repos::{
    ImageStorage, PostPatch, PostsRepo, PostsWriteRepo, RepoError, ScheduleRepo,
};
use canastra::application::schedule::ScheduleService;
use canastra::domain::entities::{NewPost, PostRecord, PostSummary};
use canastra::domain::schedule::{Clock, ScheduleConfig};
use canastra::domain::types::PostStatus;
use canastra::infra::http::AppState;
use url::Url;

#[derive(Default)]
pub struct MemoryStore {
    pub posts: Mutex<Vec<PostRecord>>,
    next_id: AtomicI64,
    /// Titles whose inserts are refused, for partial-failure scenarios.
    pub fail_insert_titles: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn refuse_title(&self, title: &str) {
        self.fail_insert_titles
            .lock()
            .unwrap()
            .insert(title.to_string());
    }

    pub fn seed(&self, post: NewPost) -> PostRecord {
        let record = self.materialize(post);
        self.posts.lock().unwrap().push(record.clone());
        record
    }

    fn materialize(&self, post: NewPost) -> PostRecord {
        let now = Utc::now();
        PostRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            slug: post.slug,
            titulo: post.titulo,
            post_type: post.post_type,
            body: post.body,
            seo: post.seo,
            modo: post.modo,
            status: post.status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn find_by_slug(
        &self,
        slug: &str,
        require_published: bool,
    ) -> Result<Option<PostRecord>, RepoError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .find(|post| {
                post.slug == slug && (!require_published || post.status == PostStatus::Publicado)
            })
            .cloned())
    }

    async fn list_published(&self) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts: Vec<PostRecord> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.status == PostStatus::Publicado)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<PostSummary>, RepoError> {
        let posts = self.list_published().await?;
        Ok(posts
            .into_iter()
            .take(limit as usize)
            .map(|post| PostSummary {
                id: post.id,
                titulo: post.titulo,
                slug: post.slug,
                created_at: post.created_at,
            })
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn insert_post(&self, post: NewPost) -> Result<PostRecord, RepoError> {
        if self.fail_insert_titles.lock().unwrap().contains(&post.titulo) {
            return Err(RepoError::Persistence("insert refused".to_string()));
        }
        let record = self.materialize(post);
        self.posts.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_post(&self, id: i64, patch: PostPatch) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;

        if let Some(titulo) = patch.titulo {
            post.titulo = titulo;
        }
        if let Some(resumo) = patch.resumo {
            post.body.resumo = Some(resumo);
        }
        if let Some(conclusao) = patch.conclusao {
            post.body.conclusao = Some(conclusao);
        }
        if let Some(status) = patch.status {
            post.status = status;
        }
        if let Some(post_type) = patch.post_type {
            post.post_type = Some(post_type);
        }
        if let Some(imagem) = patch.imagem_principal {
            post.body.imagem_principal = Some(imagem);
        }
        if let Some(alt) = patch.imagem_principal_alt {
            post.body.imagem_principal_alt = Some(alt);
        }
        if let Some(fonte) = patch.fonte {
            post.body.fonte = Some(fonte);
        }
        if let Some(description) = patch.meta_description {
            post.seo.meta_description = Some(description);
        }
        if let Some(keywords) = patch.meta_keywords {
            post.seo.meta_keywords = Some(keywords);
        }
        post.updated_at = Utc::now();

        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> Result<bool, RepoError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|post| post.id != id);
        Ok(posts.len() < before)
    }
}

#[async_trait]
impl ImageStorage for MemoryStore {
    async fn upload_image(
        &self,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, RepoError> {
        Ok("https://cdn.test/imagens-blog/upload.jpg".to_string())
    }
}

#[derive(Default)]
pub struct MemoryScheduleRepo {
    pub rows: Mutex<Vec<ScheduleConfig>>,
}

#[async_trait]
impl ScheduleRepo for MemoryScheduleRepo {
    async fn load_latest(&self) -> Result<Option<ScheduleConfig>, RepoError> {
        Ok(self.rows.lock().unwrap().last().cloned())
    }

    async fn save(&self, config: &ScheduleConfig) -> Result<(), RepoError> {
        self.rows.lock().unwrap().push(config.clone());
        Ok(())
    }
}

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now_local(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn clock_at(hour: u32, minute: u32) -> Arc<dyn Clock> {
    let now = chrono::NaiveDate::from_ymd_opt(2026, 4, 20)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap();
    Arc::new(FixedClock(now))
}

/// Scripted generator: each call pops the next canned response. Exhausted
/// scripts answer with an empty batch.
#[derive(Default)]
pub struct FakeGenerator {
    pub responses: Mutex<VecDeque<Result<Vec<Value>, GeneratorError>>>,
    pub calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn push(&self, response: Result<Vec<Value>, GeneratorError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    async fn generate(&self, _request: &GeneratorRequest) -> Result<Vec<Value>, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn site_base_url() -> Url {
    Url::parse("https://cafecanastra.com.br/").expect("valid base url")
}

pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub schedule_repo: Arc<MemoryScheduleRepo>,
    pub schedule: Arc<ScheduleService>,
    pub generator: Arc<FakeGenerator>,
    pub ingest: Arc<IngestService>,
}

/// Wire the full service graph over in-memory doubles, with the wall clock
/// pinned to the given local time.
pub fn harness_at(hour: u32, minute: u32) -> TestHarness {
    let store = Arc::new(MemoryStore::default());
    let schedule_repo = Arc::new(MemoryScheduleRepo::default());
    let schedule = Arc::new(ScheduleService::new(
        schedule_repo.clone(),
        clock_at(hour, minute),
    ));
    let generator = Arc::new(FakeGenerator::default());
    let ingest = Arc::new(IngestService::new(
        store.clone(),
        generator.clone(),
        schedule.clone(),
        site_base_url(),
    ));

    TestHarness {
        store,
        schedule_repo,
        schedule,
        generator,
        ingest,
    }
}

impl TestHarness {
    pub fn app_state(&self, admin_token: Option<&str>) -> AppState {
        AppState {
            posts: self.store.clone(),
            posts_write: self.store.clone(),
            images: self.store.clone(),
            ingest: self.ingest.clone(),
            schedule: self.schedule.clone(),
            admin_token: admin_token.map(Arc::from),
        }
    }
}
