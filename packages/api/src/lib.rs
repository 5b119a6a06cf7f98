// ABOUTME: HTTP API layer for CloudTrain
// ABOUTME: Router, shared state and handlers for the /v1/tasks resource

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::get,
    Router,
};

use cloudtrain_security::IdentityTokenValidator;
use cloudtrain_tasks::TaskManagement;

pub mod auth;
pub mod error;
pub mod extract;
pub mod tasks_handlers;

pub use auth::CurrentUser;
pub use error::{ApiResult, AppError};
pub use extract::{JsonBody, PathParam, QueryParams};

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<TaskManagement>,
    pub tokens: Arc<IdentityTokenValidator>,
}

impl AppState {
    pub fn new(tasks: TaskManagement, tokens: IdentityTokenValidator) -> Self {
        Self {
            tasks: Arc::new(tasks),
            tokens: Arc::new(tokens),
        }
    }
}

impl FromRef<AppState> for Arc<IdentityTokenValidator> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Creates the task router
pub fn create_tasks_router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/tasks",
            get(tasks_handlers::list_tasks).post(tasks_handlers::create_task),
        )
        .route("/v1/tasks/page", get(tasks_handlers::get_tasks_page))
        .route(
            "/v1/tasks/{task_id}",
            get(tasks_handlers::get_task)
                .put(tasks_handlers::update_task)
                .delete(tasks_handlers::delete_task),
        )
}
