// ABOUTME: HTTP request handlers for task operations
// ABOUTME: Maps /v1/tasks requests onto the task management boundary

use axum::{
    extract::{OriginalUri, State},
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use cloudtrain_storage::{Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use cloudtrain_tasks::Task;

use crate::auth::CurrentUser;
use crate::error::{ApiResult, AppError};
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::AppState;

/// Prefix a reverse proxy strips before forwarding to this service
const FORWARDED_PREFIX: &str = "x-forwarded-prefix";

/// List all tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<Json<Vec<Task>>> {
    info!("Listing tasks for {}", principal.name());
    let tasks = state.tasks.get_all_tasks(&principal).await?;
    Ok(Json(tasks))
}

/// Query parameters for the paged task listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default)]
    pub first_position: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Get one page of tasks
pub async fn get_tasks_page(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    QueryParams(params): QueryParams<PageParams>,
) -> ApiResult<Json<Page<Task>>> {
    info!(
        "Listing tasks for {} (first position: {}, page size: {})",
        principal.name(),
        params.first_position,
        params.page_size
    );

    if params.page_size > MAX_PAGE_SIZE {
        return Err(AppError::validation(format!(
            "page size must not exceed {}",
            MAX_PAGE_SIZE
        )));
    }

    let page = state
        .tasks
        .get_tasks_page(&principal, params.first_position, params.page_size)
        .await?;
    Ok(Json(page))
}

/// Get a single task by ID
pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    PathParam(task_id): PathParam<Uuid>,
) -> ApiResult<Json<Task>> {
    info!("Getting task: {}", task_id);
    state
        .tasks
        .get_task_by_id(&principal, task_id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// Create a new task and point the client at it
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    JsonBody(task): JsonBody<Task>,
) -> ApiResult<impl IntoResponse> {
    info!("Creating task for {}", principal.name());
    let task_id = state.tasks.add_task(&principal, task).await?;

    let prefix = headers
        .get(FORWARDED_PREFIX)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_end_matches('/'))
        .unwrap_or("");
    let location = format!(
        "{}{}/{}",
        prefix,
        uri.path().trim_end_matches('/'),
        task_id
    );

    Ok((StatusCode::CREATED, [(LOCATION, location)]))
}

/// Replace a task's state
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    PathParam(task_id): PathParam<Uuid>,
    JsonBody(task): JsonBody<Task>,
) -> ApiResult<StatusCode> {
    info!("Updating task: {}", task_id);
    state.tasks.modify_task(&principal, task_id, task).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    PathParam(task_id): PathParam<Uuid>,
) -> ApiResult<StatusCode> {
    info!("Deleting task: {}", task_id);
    state.tasks.remove_task(&principal, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
