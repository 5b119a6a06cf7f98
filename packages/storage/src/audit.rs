// ABOUTME: Audit block embedded in entities and the listener that stamps it
// ABOUTME: Creation fields are set once; last-modified fields follow every update

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use cloudtrain_core::{truncate, Principal};

use crate::entity::Entity;
use crate::query::QueryValue;

/// Width of the created_by / last_modified_by columns
pub const AUDIT_USER_ID_MAX_LEN: usize = 31;

pub const CREATED_BY_COLUMN: &str = "created_by";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const LAST_MODIFIED_BY_COLUMN: &str = "last_modified_by";
pub const LAST_MODIFIED_AT_COLUMN: &str = "last_modified_at";

/// Who created and last modified an entity, and when.
///
/// Audit fields are written only by the repository; values sent by clients
/// are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditInfo {
    #[serde(skip_deserializing)]
    pub created_by: Option<String>,
    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub last_modified_by: Option<String>,
    #[serde(skip_deserializing)]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl AuditInfo {
    /// Read the four audit columns from a row
    pub fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            created_by: row.try_get(CREATED_BY_COLUMN)?,
            created_at: row.try_get(CREATED_AT_COLUMN)?,
            last_modified_by: row.try_get(LAST_MODIFIED_BY_COLUMN)?,
            last_modified_at: row.try_get(LAST_MODIFIED_AT_COLUMN)?,
        })
    }

    /// Stamp creation. Fields that already hold a value are kept.
    pub fn track_creation(&mut self, user_id: &str, now: DateTime<Utc>) {
        let user_id = truncate(user_id, AUDIT_USER_ID_MAX_LEN);
        if self.created_by.is_none() {
            self.created_by = Some(user_id.clone());
        }
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        if self.last_modified_by.is_none() {
            self.last_modified_by = Some(user_id);
        }
        if self.last_modified_at.is_none() {
            self.last_modified_at = Some(now);
        }
    }

    /// Stamp a modification, replacing the previous last-modified pair
    pub fn track_modification(&mut self, user_id: &str, now: DateTime<Utc>) {
        self.last_modified_by = Some(truncate(user_id, AUDIT_USER_ID_MAX_LEN));
        self.last_modified_at = Some(now);
    }

    /// Override audit data with values from a trusted source such as an import.
    ///
    /// The creation pair is replaced only by an earlier creation time, the
    /// modification pair only by a later modification time.
    pub fn track_custom_audit_information(
        &mut self,
        created_by: &str,
        created_at: DateTime<Utc>,
        last_modified_by: &str,
        last_modified_at: DateTime<Utc>,
    ) {
        if self.created_at.is_none_or(|current| created_at < current) {
            self.created_by = Some(truncate(created_by, AUDIT_USER_ID_MAX_LEN));
            self.created_at = Some(created_at);
        }
        if self
            .last_modified_at
            .is_none_or(|current| last_modified_at > current)
        {
            self.last_modified_by = Some(truncate(last_modified_by, AUDIT_USER_ID_MAX_LEN));
            self.last_modified_at = Some(last_modified_at);
        }
    }

    /// Column values written on insert
    pub fn insert_columns(&self) -> Vec<(&'static str, QueryValue)> {
        vec![
            (CREATED_BY_COLUMN, self.created_by.clone().into()),
            (CREATED_AT_COLUMN, self.created_at.into()),
            (LAST_MODIFIED_BY_COLUMN, self.last_modified_by.clone().into()),
            (LAST_MODIFIED_AT_COLUMN, self.last_modified_at.into()),
        ]
    }

    /// Column values written on update; creation columns are never rewritten
    pub fn update_columns(&self) -> Vec<(&'static str, QueryValue)> {
        vec![
            (LAST_MODIFIED_BY_COLUMN, self.last_modified_by.clone().into()),
            (LAST_MODIFIED_AT_COLUMN, self.last_modified_at.into()),
        ]
    }
}

/// Stamps audit blocks around repository writes
pub struct AuditListener;

impl AuditListener {
    pub fn on_pre_persist<T: Entity>(entity: &mut T, principal: &Principal, now: DateTime<Utc>) {
        if let Some(audit) = entity.audit_mut() {
            audit.track_creation(principal.name(), now);
            debug!(
                "Stamped creation of {} by {}",
                T::ENTITY_NAME,
                principal.name()
            );
        }
    }

    pub fn on_pre_update<T: Entity>(entity: &mut T, principal: &Principal, now: DateTime<Utc>) {
        if let Some(audit) = entity.audit_mut() {
            audit.track_modification(principal.name(), now);
            debug!(
                "Stamped modification of {} by {}",
                T::ENTITY_NAME,
                principal.name()
            );
        }
    }
}
