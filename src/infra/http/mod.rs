//! HTTP surface: one axum router serving the public reads, the ingestion
//! entry points, the schedule-config CRUD, and the token-guarded admin
//! routes.

mod admin;
pub mod error;
mod ingest;
mod middleware;
mod public;
mod schedule;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};

pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/posts", get(admin::list_all_posts))
        .route(
            "/api/admin/posts/{id}",
            patch(admin::update_post).delete(admin::delete_post),
        )
        .route("/api/admin/uploads", post(admin::upload_image))
        .layer(from_fn_with_state(state.clone(), middleware::admin_auth));

    Router::new()
        .route("/health", get(public::health))
        .route("/api/posts", get(public::list_posts))
        .route("/api/posts/recent", get(public::list_recent_posts))
        .route("/api/posts/{slug}", get(public::get_post_by_slug))
        .route("/api/webhook/posts", post(ingest::webhook_posts))
        .route("/api/scheduled/generate", post(ingest::scheduled_generate))
        .route(
            "/api/schedule-config",
            get(schedule::get_config)
                .put(schedule::put_config)
                .patch(schedule::patch_config),
        )
        .merge(admin_routes)
        .with_state(state)
}
