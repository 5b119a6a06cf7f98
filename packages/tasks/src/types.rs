// ABOUTME: Task type definitions
// ABOUTME: Task record, its classification enums, lifecycle transitions and field bounds

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cloudtrain_core::{check_max_length, check_range, ValidationError};
use cloudtrain_storage::AuditInfo;

use crate::error::TaskError;

pub const SUBJECT_MAX_LEN: usize = 80;
pub const DESCRIPTION_MAX_LEN: usize = 1024;
pub const RESPONSIBLE_USER_ID_MAX_LEN: usize = 16;
pub const AFFECTED_ID_MAX_LEN: usize = 32;
pub const AFFECTED_RESOURCE_MAX_LEN: usize = 256;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskCategory {
    #[default]
    Undefined,
    Bugfix,
    Refactoring,
    NewFeature,
    PerformanceImprovement,
    ReleaseManagement,
    QualityAssurance,
    BuildFailure,
    Communication,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Undefined => "UNDEFINED",
            TaskCategory::Bugfix => "BUGFIX",
            TaskCategory::Refactoring => "REFACTORING",
            TaskCategory::NewFeature => "NEW_FEATURE",
            TaskCategory::PerformanceImprovement => "PERFORMANCE_IMPROVEMENT",
            TaskCategory::ReleaseManagement => "RELEASE_MANAGEMENT",
            TaskCategory::QualityAssurance => "QUALITY_ASSURANCE",
            TaskCategory::BuildFailure => "BUILD_FAILURE",
            TaskCategory::Communication => "COMMUNICATION",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    #[default]
    Undefined,
    Low,
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Undefined => "UNDEFINED",
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
            TaskPriority::Critical => "CRITICAL",
        }
    }
}

/// Lifecycle of a task.
///
/// `OpenUnderWork` tasks are still being written by their submitter. Submitting
/// moves them to `OpenRunning`, from where they are completed, revoked by the
/// submitter or cancelled by a responsible. Closed states are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskLifeCycleState {
    #[default]
    Undefined,
    OpenUnderWork,
    OpenRunning,
    ClosedCompleted,
    ClosedRevoked,
    ClosedCancelled,
}

impl TaskLifeCycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskLifeCycleState::Undefined => "UNDEFINED",
            TaskLifeCycleState::OpenUnderWork => "OPEN_UNDER_WORK",
            TaskLifeCycleState::OpenRunning => "OPEN_RUNNING",
            TaskLifeCycleState::ClosedCompleted => "CLOSED_COMPLETED",
            TaskLifeCycleState::ClosedRevoked => "CLOSED_REVOKED",
            TaskLifeCycleState::ClosedCancelled => "CLOSED_CANCELLED",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            TaskLifeCycleState::ClosedCompleted
                | TaskLifeCycleState::ClosedRevoked
                | TaskLifeCycleState::ClosedCancelled
        )
    }

    /// Whether a task in this state may move to `next`. Staying put is always allowed.
    pub fn can_transition_to(&self, next: TaskLifeCycleState) -> bool {
        use TaskLifeCycleState::*;

        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (Undefined, OpenUnderWork)
                | (Undefined, OpenRunning)
                | (OpenUnderWork, OpenRunning)
                | (OpenRunning, ClosedCompleted)
                | (OpenRunning, ClosedRevoked)
                | (OpenRunning, ClosedCancelled)
        )
    }
}

impl std::fmt::Display for TaskLifeCycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub(crate) id: Option<Uuid>,
    pub subject: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub life_cycle_state: TaskLifeCycleState,
    pub submitted_at: Option<NaiveDateTime>,
    pub submitter_user_id: Option<String>,
    pub due_date: Option<NaiveDateTime>,
    /// Percent complete, 0 to 100
    #[serde(default)]
    pub completion_rate: i32,
    pub completion_date: Option<NaiveDateTime>,
    pub completed_by_user_id: Option<String>,
    pub responsible_user_id: Option<String>,
    pub affected_project_id: Option<String>,
    pub affected_application_id: Option<String>,
    pub affected_module: Option<String>,
    pub affected_resource: Option<String>,
    /// Hours
    #[serde(default)]
    pub estimated_effort: i32,
    #[serde(default)]
    pub actual_effort: i32,
    #[serde(default)]
    pub(crate) version: i64,
    #[serde(flatten)]
    pub audit: AuditInfo,
}

impl Task {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Assign the task's identity. An identity is assigned once and never replaced.
    pub fn set_id(&mut self, id: Uuid) -> Result<(), TaskError> {
        if let Some(existing) = self.id {
            return Err(TaskError::IdAlreadySet(existing));
        }
        self.id = Some(id);
        Ok(())
    }

    /// Optimistic lock version read from the store
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_max_length("subject", self.subject.as_deref(), SUBJECT_MAX_LEN)?;
        check_max_length(
            "description",
            self.description.as_deref(),
            DESCRIPTION_MAX_LEN,
        )?;
        check_max_length(
            "responsibleUserId",
            self.responsible_user_id.as_deref(),
            RESPONSIBLE_USER_ID_MAX_LEN,
        )?;
        check_max_length(
            "affectedProjectId",
            self.affected_project_id.as_deref(),
            AFFECTED_ID_MAX_LEN,
        )?;
        check_max_length(
            "affectedApplicationId",
            self.affected_application_id.as_deref(),
            AFFECTED_ID_MAX_LEN,
        )?;
        check_max_length(
            "affectedModule",
            self.affected_module.as_deref(),
            AFFECTED_ID_MAX_LEN,
        )?;
        check_max_length(
            "affectedResource",
            self.affected_resource.as_deref(),
            AFFECTED_RESOURCE_MAX_LEN,
        )?;
        check_range("completionRate", i64::from(self.completion_rate), 0, 100)?;
        Ok(())
    }
}
