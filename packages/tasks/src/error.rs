// ABOUTME: Error type for task operations
// ABOUTME: Wraps validation, lifecycle, permission and storage failures without collapsing them

use thiserror::Error;
use uuid::Uuid;

use cloudtrain_core::ValidationError;
use cloudtrain_security::PermissionError;
use cloudtrain_storage::StorageError;

use crate::types::TaskLifeCycleState;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Invalid task: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task cannot move from {from} to {to}")]
    IllegalTransition {
        from: TaskLifeCycleState,
        to: TaskLifeCycleState,
    },

    #[error("Task ID already set: {0}")]
    IdAlreadySet(Uuid),

    #[error("Task ID {body} does not match task ID {path} of the request")]
    IdMismatch { path: Uuid, body: Uuid },

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type TaskResult<T> = Result<T, TaskError>;
