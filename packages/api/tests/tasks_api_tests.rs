// ABOUTME: End-to-end tests for the /v1/tasks HTTP resource
// ABOUTME: Drives the router with oneshot requests against in-memory SQLite and a mocked permission service

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cloudtrain_api::{create_tasks_router, AppState};
use cloudtrain_security::{
    GrantedPermissionsClient, IdentityClaims, IdentityTokenValidator, UserPermissionVerifier,
};
use cloudtrain_storage::GenericRepository;
use cloudtrain_tasks::{Task, TaskManagement, TASK_CREATE, TASK_DELETE, TASK_READ, TASK_UPDATE};

const SECRET: &[u8] = b"api-test-secret-with-enough-length";
const ALL_PERMISSIONS: &[&str] = &[TASK_CREATE, TASK_READ, TASK_UPDATE, TASK_DELETE];

struct TestApp {
    router: Router,
    repository: Arc<GenericRepository>,
    token: String,
    _permission_service: MockServer,
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn request(&self, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn count_rows(&self) -> i64 {
        self.repository
            .count_entities("Task.COUNT_ALL", None)
            .await
            .unwrap()
    }
}

async fn spawn_app_with(permission_response: ResponseTemplate) -> TestApp {
    let token = IdentityClaims::new("7f3c-alice", chrono::Duration::minutes(5))
        .with_preferred_username("alice")
        .sign(SECRET)
        .unwrap();

    let permission_service = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/grantedPermissions"))
        .and(header_matcher("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(permission_response)
        .mount(&permission_service)
        .await;

    let client = GrantedPermissionsClient::new(
        permission_service.uri(),
        Duration::from_secs(5),
        Duration::from_secs(1),
    )
    .unwrap();

    let pool = cloudtrain_storage::init("sqlite::memory:", 1).await.unwrap();
    let repository = Arc::new(GenericRepository::new(pool).with_entity::<Task>());
    let tasks = TaskManagement::new(
        repository.clone(),
        UserPermissionVerifier::new(Arc::new(client)),
    );
    let state = AppState::new(tasks, IdentityTokenValidator::new(SECRET, None));

    let router = Router::new()
        .nest("/api", create_tasks_router())
        .with_state(state);

    TestApp {
        router,
        repository,
        token,
        _permission_service: permission_service,
    }
}

async fn spawn_app(grants: &[&str]) -> TestApp {
    let body: Vec<Value> = grants
        .iter()
        .map(|permission| json!({ "permission": permission }))
        .collect();
    spawn_app_with(ResponseTemplate::new(200).set_body_json(body)).await
}

fn sample_task() -> Value {
    json!({
        "subject": "test",
        "category": "NEW_FEATURE",
        "priority": "MEDIUM",
        "lifeCycleState": "OPEN_UNDER_WORK",
        "affectedProjectId": "P1",
        "affectedApplicationId": "A1"
    })
}

async fn create(app: &TestApp) -> String {
    let (status, headers, _) = app
        .send(app.request("POST", "/api/v1/tasks", Some(sample_task())))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    headers
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_create_then_fetch_task() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let location = create(&app).await;
    assert!(location.starts_with("/api/v1/tasks/"));
    let task_id = location.trim_start_matches("/api/v1/tasks/");
    assert!(Uuid::parse_str(task_id).is_ok());

    let (status, _, body) = app.send(app.request("GET", &location, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], task_id);
    assert_eq!(body["subject"], "test");
    assert_eq!(body["category"], "NEW_FEATURE");
    assert_eq!(body["priority"], "MEDIUM");
    assert_eq!(body["lifeCycleState"], "OPEN_UNDER_WORK");
    assert_eq!(body["affectedProjectId"], "P1");
    assert_eq!(body["createdBy"], "alice");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_location_honours_forwarded_prefix() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let mut request = app.request("POST", "/api/v1/tasks", Some(sample_task()));
    request
        .headers_mut()
        .insert("x-forwarded-prefix", "/cloudtrain/".parse().unwrap());
    let (status, headers, _) = app.send(request).await;

    assert_eq!(status, StatusCode::CREATED);
    let location = headers.get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("/cloudtrain/api/v1/tasks/"));
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let uri = format!("/api/v1/tasks/{}", Uuid::new_v4());
    let (status, _, body) = app.send(app.request("GET", &uri, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_without_permission_is_forbidden() {
    let app = spawn_app(&[TASK_READ]).await;

    let (status, _, body) = app
        .send(app.request("POST", "/api/v1/tasks", Some(sample_task())))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(app.count_rows().await, 0);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let request = Request::builder()
        .uri("/api/v1/tasks")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_forged_token_is_unauthorized() {
    let app = spawn_app(ALL_PERMISSIONS).await;
    let forged = IdentityClaims::new("mallory", chrono::Duration::minutes(5))
        .sign(b"some-other-secret-of-enough-length")
        .unwrap();

    let request = Request::builder()
        .uri("/api/v1/tasks")
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_task_is_rejected() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let mut task = sample_task();
    task["subject"] = json!("s".repeat(81));
    let (status, _, body) = app
        .send(app.request("POST", "/api/v1/tasks", Some(task)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(app.count_rows().await, 0);
}

#[tokio::test]
async fn test_update_with_stale_version_conflicts() {
    let app = spawn_app(ALL_PERMISSIONS).await;
    let location = create(&app).await;

    let (_, _, mut task) = app.send(app.request("GET", &location, None)).await;
    task["subject"] = json!("changed");

    let (status, _, _) = app
        .send(app.request("PUT", &location, Some(task.clone())))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = app.send(app.request("PUT", &location, Some(task))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONCURRENT_MODIFICATION");

    let (_, _, stored) = app.send(app.request("GET", &location, None)).await;
    assert_eq!(stored["subject"], "changed");
    assert_eq!(stored["version"], 1);
}

#[tokio::test]
async fn test_update_with_mismatched_id_is_rejected() {
    let app = spawn_app(ALL_PERMISSIONS).await;
    let location = create(&app).await;

    let (_, _, mut task) = app.send(app.request("GET", &location, None)).await;
    task["id"] = json!(Uuid::new_v4().to_string());

    let (status, _, body) = app.send(app.request("PUT", &location, Some(task))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "ID_MISMATCH");
}

#[tokio::test]
async fn test_delete_is_repeatable() {
    let app = spawn_app(ALL_PERMISSIONS).await;
    let location = create(&app).await;

    let (status, _, _) = app.send(app.request("DELETE", &location, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app.send(app.request("DELETE", &location, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app.send(app.request("GET", &location, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_and_page_tasks() {
    let app = spawn_app(ALL_PERMISSIONS).await;
    for _ in 0..3 {
        create(&app).await;
    }

    let (status, _, body) = app.send(app.request("GET", "/api/v1/tasks", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, _, page) = app
        .send(app.request(
            "GET",
            "/api/v1/tasks/page?firstPosition=0&pageSize=2",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["elements"].as_array().unwrap().len(), 2);
    assert_eq!(page["firstPosition"], 0);
    assert_eq!(page["numberOfElements"], 3);

    let (status, _, _) = app
        .send(app.request("GET", "/api/v1/tasks/page?pageSize=1000", None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_permission_service_failure_is_bad_gateway() {
    let app = spawn_app_with(ResponseTemplate::new(503)).await;

    let (status, _, body) = app.send(app.request("GET", "/api/v1/tasks", None)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "PERMISSION_SERVICE_ERROR");
}

#[tokio::test]
async fn test_unknown_enum_value_is_rejected() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let mut task = sample_task();
    task["category"] = json!("BOGUS");
    let (status, _, body) = app
        .send(app.request("POST", "/api/v1/tasks", Some(task)))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["request_id"].is_string());
    assert_eq!(app.count_rows().await, 0);
}

#[tokio::test]
async fn test_malformed_update_body_is_rejected() {
    let app = spawn_app(ALL_PERMISSIONS).await;
    let location = create(&app).await;

    let request = Request::builder()
        .method("PUT")
        .uri(&location)
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"subject\": "))
        .unwrap();
    let (status, _, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_task_id_is_rejected() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let (status, _, body) = app
        .send(app.request("GET", "/api/v1/tasks/not-a-uuid", None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_malformed_page_query_is_rejected() {
    let app = spawn_app(ALL_PERMISSIONS).await;

    let (status, _, body) = app
        .send(app.request("GET", "/api/v1/tasks/page?pageSize=many", None))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
