// ABOUTME: Tests for the assembled server router
// ABOUTME: Checks health probes, CORS headers and that task routes sit behind authentication

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::ServiceExt;

use cloudtrain_api::AppState;
use cloudtrain_cli::{build_app, build_state, Config};
use cloudtrain_security::{IdentityTokenValidator, StaticPermissions, UserPermissionVerifier};
use cloudtrain_storage::GenericRepository;
use cloudtrain_tasks::{Task, TaskManagement};

const ORIGIN: &str = "http://localhost:4200";

async fn app() -> Router {
    let pool = cloudtrain_storage::init("sqlite::memory:", 1).await.unwrap();
    let repository = Arc::new(GenericRepository::new(pool).with_entity::<Task>());
    let verifier = UserPermissionVerifier::new(Arc::new(StaticPermissions::new(Vec::<String>::new())));
    let state = AppState::new(
        TaskManagement::new(repository, verifier),
        IdentityTokenValidator::new(b"server-test-secret", None),
    );
    build_app(state, ORIGIN).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "cloudtrain");

    let response = app
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["uptime"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn test_task_routes_require_token() {
    let response = app()
        .await
        .oneshot(Request::get("/api/v1/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/tasks")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        ORIGIN
    );
}

#[tokio::test]
async fn test_invalid_cors_origin_is_rejected() {
    let pool = cloudtrain_storage::init("sqlite::memory:", 1).await.unwrap();
    let repository = Arc::new(GenericRepository::new(pool).with_entity::<Task>());
    let verifier = UserPermissionVerifier::new(Arc::new(StaticPermissions::new(Vec::<String>::new())));
    let state = AppState::new(
        TaskManagement::new(repository, verifier),
        IdentityTokenValidator::new(b"server-test-secret", None),
    );

    assert!(build_app(state, "http://bad\norigin").is_err());
}

#[tokio::test]
async fn test_state_requires_permission_service_and_secret() {
    let config = Config::from_lookup(|name| match name {
        "CLOUDTRAIN_DATABASE_URL" => Some("sqlite::memory:".to_string()),
        _ => None,
    })
    .unwrap();

    let err = build_state(&config).await.err().unwrap();
    assert!(err.to_string().contains("CLOUDTRAIN_GRANTED_PERMISSIONS_URL"));
}
