// ABOUTME: Persistence mapping of tasks onto the t_task table
// ABOUTME: Row hydration, column values and the named task queries

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use cloudtrain_storage::{AuditInfo, Entity, NamedQuery, QueryValue};

use crate::types::Task;

pub const QUERY_ALL: &str = "Task.QUERY_ALL";
pub const COUNT_ALL: &str = "Task.COUNT_ALL";

const TASK_QUERIES: &[NamedQuery] = &[
    NamedQuery::new(QUERY_ALL, "SELECT * FROM t_task ORDER BY task_id"),
    NamedQuery::new(COUNT_ALL, "SELECT COUNT(*) FROM t_task"),
];

impl<'r> FromRow<'r, SqliteRow> for Task {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Task {
            id: row.try_get("task_id")?,
            subject: row.try_get("subject")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            priority: row.try_get("priority")?,
            life_cycle_state: row.try_get("lifecycle_state")?,
            submitted_at: row.try_get("submission_date")?,
            submitter_user_id: row.try_get("submitter_user_id")?,
            due_date: row.try_get("due_date")?,
            completion_rate: row.try_get("completion_rate")?,
            completion_date: row.try_get("completion_date")?,
            completed_by_user_id: row.try_get("completer_user_id")?,
            responsible_user_id: row.try_get("responsible_user_id")?,
            affected_project_id: row.try_get("affected_project_id")?,
            affected_application_id: row.try_get("affected_application_id")?,
            affected_module: row.try_get("affected_module")?,
            affected_resource: row.try_get("affected_resource")?,
            estimated_effort: row.try_get("estimated_effort")?,
            actual_effort: row.try_get("actual_effort")?,
            version: row.try_get("opt_lock_version")?,
            audit: AuditInfo::from_row(row)?,
        })
    }
}

impl Entity for Task {
    type Key = Uuid;

    const ENTITY_NAME: &'static str = "Task";
    const TABLE_NAME: &'static str = "t_task";
    const KEY_COLUMN: &'static str = "task_id";

    fn key(&self) -> Option<Uuid> {
        self.id()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn columns(&self) -> Vec<(&'static str, QueryValue)> {
        vec![
            ("subject", self.subject.clone().into()),
            ("description", self.description.clone().into()),
            ("category", self.category.as_str().into()),
            ("priority", self.priority.as_str().into()),
            ("lifecycle_state", self.life_cycle_state.as_str().into()),
            ("submission_date", self.submitted_at.into()),
            ("submitter_user_id", self.submitter_user_id.clone().into()),
            ("due_date", self.due_date.into()),
            ("completion_rate", self.completion_rate.into()),
            ("completion_date", self.completion_date.into()),
            ("completer_user_id", self.completed_by_user_id.clone().into()),
            ("responsible_user_id", self.responsible_user_id.clone().into()),
            ("affected_project_id", self.affected_project_id.clone().into()),
            (
                "affected_application_id",
                self.affected_application_id.clone().into(),
            ),
            ("affected_module", self.affected_module.clone().into()),
            ("affected_resource", self.affected_resource.clone().into()),
            ("estimated_effort", self.estimated_effort.into()),
            ("actual_effort", self.actual_effort.into()),
        ]
    }

    fn named_queries() -> &'static [NamedQuery] {
        TASK_QUERIES
    }

    fn audit(&self) -> Option<&AuditInfo> {
        Some(&self.audit)
    }

    fn audit_mut(&mut self) -> Option<&mut AuditInfo> {
        Some(&mut self.audit)
    }
}
