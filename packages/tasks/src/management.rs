// ABOUTME: Task management boundary between the REST layer and the repository
// ABOUTME: Every operation checks the caller's permission before touching the store

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use cloudtrain_core::Principal;
use cloudtrain_security::UserPermissionVerifier;
use cloudtrain_storage::{Page, PageCriteria, Repository};

use crate::error::{TaskError, TaskResult};
use crate::storage::{COUNT_ALL, QUERY_ALL};
use crate::types::Task;

pub const TASK_CREATE: &str = "TASK_CREATE";
pub const TASK_READ: &str = "TASK_READ";
pub const TASK_UPDATE: &str = "TASK_UPDATE";
pub const TASK_DELETE: &str = "TASK_DELETE";

pub struct TaskManagement {
    repository: Arc<dyn Repository<Task>>,
    verifier: UserPermissionVerifier,
}

impl TaskManagement {
    pub fn new(repository: Arc<dyn Repository<Task>>, verifier: UserPermissionVerifier) -> Self {
        Self {
            repository,
            verifier,
        }
    }

    /// Store a new task under a freshly generated id and return that id
    pub async fn add_task(&self, principal: &Principal, mut new_task: Task) -> TaskResult<Uuid> {
        self.verifier
            .require_permission(principal, TASK_CREATE)
            .await?;
        new_task.validate()?;

        let task_id = Uuid::new_v4();
        new_task.set_id(task_id)?;

        info!("Creating task {} for {}", task_id, principal.name());
        self.repository
            .add_entity(principal, &mut new_task, true)
            .await?;
        Ok(task_id)
    }

    /// Replace the stored state of task `task_id`.
    ///
    /// The task must carry the version it was read with, and its lifecycle
    /// state must be reachable from the stored one.
    pub async fn modify_task(
        &self,
        principal: &Principal,
        task_id: Uuid,
        mut modified_task: Task,
    ) -> TaskResult<()> {
        self.verifier
            .require_permission(principal, TASK_UPDATE)
            .await?;

        match modified_task.id() {
            Some(body_id) if body_id != task_id => {
                return Err(TaskError::IdMismatch {
                    path: task_id,
                    body: body_id,
                })
            }
            Some(_) => {}
            None => modified_task.set_id(task_id)?,
        }
        modified_task.validate()?;

        let stored = self.repository.get_required_entity_by_id(&task_id).await?;
        if !stored
            .life_cycle_state
            .can_transition_to(modified_task.life_cycle_state)
        {
            return Err(TaskError::IllegalTransition {
                from: stored.life_cycle_state,
                to: modified_task.life_cycle_state,
            });
        }

        info!("Updating task {} for {}", task_id, principal.name());
        self.repository
            .set_entity(principal, &mut modified_task)
            .await?;
        Ok(())
    }

    pub async fn get_task_by_id(
        &self,
        principal: &Principal,
        task_id: Uuid,
    ) -> TaskResult<Option<Task>> {
        self.verifier.require_permission(principal, TASK_READ).await?;
        debug!("Fetching task {}", task_id);
        Ok(self.repository.get_entity_by_id(&task_id).await?)
    }

    /// Delete task `task_id`; deleting an absent task succeeds
    pub async fn remove_task(&self, principal: &Principal, task_id: Uuid) -> TaskResult<()> {
        self.verifier
            .require_permission(principal, TASK_DELETE)
            .await?;
        info!("Deleting task {} for {}", task_id, principal.name());
        self.repository.remove_entity_by_id(&task_id).await?;
        Ok(())
    }

    pub async fn get_all_tasks(&self, principal: &Principal) -> TaskResult<Vec<Task>> {
        self.verifier.require_permission(principal, TASK_READ).await?;
        Ok(self.repository.query_entities(QUERY_ALL, None).await?)
    }

    pub async fn get_tasks_page(
        &self,
        principal: &Principal,
        first_position: i64,
        page_size: i64,
    ) -> TaskResult<Page<Task>> {
        self.verifier.require_permission(principal, TASK_READ).await?;
        debug!(
            "Fetching tasks (first position: {}, page size: {})",
            first_position, page_size
        );
        let criteria = PageCriteria::new(first_position, page_size);
        Ok(self
            .repository
            .query_page(QUERY_ALL, COUNT_ALL, &criteria)
            .await?)
    }
}
