// ABOUTME: Task domain for CloudTrain
// ABOUTME: Task entity with lifecycle rules, its table mapping, and the permission-checked boundary

pub mod error;
pub mod management;
pub mod storage;
pub mod types;

pub use error::{TaskError, TaskResult};
pub use management::{TaskManagement, TASK_CREATE, TASK_DELETE, TASK_READ, TASK_UPDATE};
pub use storage::{COUNT_ALL, QUERY_ALL};
pub use types::{Task, TaskCategory, TaskLifeCycleState, TaskPriority};
