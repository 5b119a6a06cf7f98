// ABOUTME: Router assembly for the CloudTrain server
// ABOUTME: Mounts health probes and the task resource under /api

use axum::{routing::get, Router};

use cloudtrain_api::{create_tasks_router, AppState};

pub mod health;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/status", get(health::status_check))
        .nest("/api", create_tasks_router())
        .with_state(state)
}
