//! Router-level tests over in-memory doubles.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use canastra::application::normalizer::{self, NormalizeContext};
use canastra::domain::types::{GenerationMode, PostStatus};
use canastra::infra::http::build_router;

use common::{TestHarness, harness_at, site_base_url};

fn router(harness: &TestHarness, admin_token: Option<&str>) -> Router {
    build_router(harness.app_state(admin_token))
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn seed_post(harness: &TestHarness, titulo: &str, status: PostStatus) -> i64 {
    let base = site_base_url();
    let raw = json!({"titulo": titulo})
        .as_object()
        .expect("payload object")
        .clone();
    let mut post = normalizer::normalize(
        &raw,
        &NormalizeContext {
            modo: GenerationMode::Automatico,
            site_base_url: &base,
        },
    );
    post.status = status;
    harness.store.seed(post).id
}

#[tokio::test]
async fn webhook_single_object_creates_a_published_post() {
    let harness = harness_at(8, 0);

    let (status, body) = send(
        router(&harness, None),
        json_request(
            "POST",
            "/api/webhook/posts",
            json!({"titulo": "X", "post_type": null}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["created_posts"], json!(1));
    assert_eq!(body["results"][0]["slug"], json!("x"));

    let stored = harness.store.posts.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].slug, "x");
    assert_eq!(stored[0].status, PostStatus::Publicado);
    assert_eq!(stored[0].modo, GenerationMode::Automatico);
}

#[tokio::test]
async fn webhook_rejects_scalar_payloads() {
    let harness = harness_at(8, 0);

    let (status, body) = send(
        router(&harness, None),
        json_request("POST", "/api/webhook/posts", json!("solto")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("malformed_payload"));
}

#[tokio::test]
async fn drafts_are_invisible_to_the_public_surface() {
    let harness = harness_at(8, 0);
    seed_post(&harness, "Publicado", PostStatus::Publicado);
    seed_post(&harness, "Rascunho secreto", PostStatus::Rascunho);

    let (status, body) = send(router(&harness, None), get_request("/api/posts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 1);
    assert_eq!(body[0]["titulo"], json!("Publicado"));

    let (status, _) = send(
        router(&harness, None),
        get_request("/api/posts/rascunho-secreto"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(router(&harness, None), get_request("/api/admin/posts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn recent_posts_are_a_light_projection() {
    let harness = harness_at(8, 0);
    seed_post(&harness, "Primeiro", PostStatus::Publicado);
    seed_post(&harness, "Segundo", PostStatus::Publicado);

    let (status, body) = send(
        router(&harness, None),
        get_request("/api/posts/recent?limit=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().expect("array");
    assert_eq!(items.len(), 1);
    let summary = items[0].as_object().expect("summary object");
    assert_eq!(summary.len(), 4);
    for key in ["id", "titulo", "slug", "created_at"] {
        assert!(summary.contains_key(key), "missing `{key}`");
    }
}

#[tokio::test]
async fn admin_routes_require_the_configured_token() {
    let harness = harness_at(8, 0);
    seed_post(&harness, "Qualquer", PostStatus::Publicado);

    let (status, _) = send(
        router(&harness, Some("segredo")),
        get_request("/api/admin/posts"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method("GET")
        .uri("/api/admin/posts")
        .header(header::AUTHORIZATION, "Bearer segredo")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(router(&harness, Some("segredo")), request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_patch_updates_named_fields_only() {
    let harness = harness_at(8, 0);
    let id = seed_post(&harness, "Original", PostStatus::Publicado);

    let (status, body) = send(
        router(&harness, None),
        json_request(
            "PATCH",
            &format!("/api/admin/posts/{id}"),
            json!({"resumo": "Novo resumo", "status": "rascunho"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["titulo"], json!("Original"));
    assert_eq!(body["resumo"], json!("Novo resumo"));
    assert_eq!(body["status"], json!("rascunho"));
}

#[tokio::test]
async fn delete_returns_404_once_the_post_is_gone() {
    let harness = harness_at(8, 0);
    let id = seed_post(&harness, "Descartável", PostStatus::Rascunho);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/posts/{id}"))
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(router(&harness, None), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/admin/posts/{id}"))
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(router(&harness, None), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn schedule_config_put_validates_before_writing() {
    let harness = harness_at(8, 0);

    let (status, body) = send(
        router(&harness, None),
        json_request(
            "PUT",
            "/api/schedule-config",
            json!({
                "is_enabled": true,
                "start_hour": 7,
                "end_hour": 24,
                "modo": "automático",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("validation_error"));
    assert!(harness.schedule_repo.rows.lock().unwrap().is_empty());

    let (status, body) = send(
        router(&harness, None),
        json_request(
            "PUT",
            "/api/schedule-config",
            json!({
                "is_enabled": true,
                "start_hour": 6,
                "end_hour": 11,
                "modo": "personalizado",
                "tema": "cafés da Canastra",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_enabled"], json!(true));
    assert_eq!(body["modo"], json!("personalizado"));
    assert_eq!(harness.schedule_repo.rows.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn schedule_config_get_returns_the_fallback_when_unset() {
    let harness = harness_at(8, 0);

    let (status, body) = send(router(&harness, None), get_request("/api/schedule-config")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_enabled"], json!(false));
    assert_eq!(body["start_hour"], json!(7));
    assert_eq!(body["end_hour"], json!(10));
}

#[tokio::test]
async fn scheduled_endpoint_reports_soft_rejections_as_json() {
    let harness = harness_at(11, 0);
    harness.schedule_repo.rows.lock().unwrap().push(
        canastra::domain::schedule::ScheduleConfig {
            is_enabled: true,
            start_hour: 7,
            end_hour: 10,
            modo: GenerationMode::Automatico,
            tema: None,
            publico_alvo: None,
            updated_at: chrono::Utc::now(),
        },
    );

    let (status, body) = send(
        router(&harness, None),
        json_request("POST", "/api/scheduled/generate", json!({"quantidade": 1, "atraso": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["reason"], json!("outside_schedule"));
    assert_eq!(body["current_time"], json!("11:00"));
    assert_eq!(body["allowed_window"], json!("07:00-10:00"));
    assert_eq!(harness.generator.call_count(), 0);
}

#[tokio::test]
async fn health_answers_no_content() {
    let harness = harness_at(8, 0);
    let (status, _) = send(router(&harness, None), get_request("/health")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
