// ABOUTME: Contract every persisted entity implements for the generic repository
// ABOUTME: Describes table layout, key, optimistic lock version, audit block and named queries

use std::fmt::Display;

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use crate::audit::AuditInfo;
use crate::query::QueryValue;

/// A predefined query registered under a unique name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

impl NamedQuery {
    pub const fn new(name: &'static str, sql: &'static str) -> Self {
        Self { name, sql }
    }
}

/// A row-backed entity the [`GenericRepository`](crate::GenericRepository)
/// can insert, update, delete and query.
///
/// Hydration goes through `sqlx::FromRow`, so `SELECT *` queries registered
/// in [`Entity::named_queries`] must return every column `from_row` reads.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    type Key: Clone + Display + Into<QueryValue> + Send + Sync + 'static;

    /// Name used in error messages
    const ENTITY_NAME: &'static str;
    const TABLE_NAME: &'static str;
    const KEY_COLUMN: &'static str;
    const VERSION_COLUMN: &'static str = "opt_lock_version";

    fn key(&self) -> Option<Self::Key>;

    fn version(&self) -> i64;

    fn set_version(&mut self, version: i64);

    /// Values of every column other than key, version and audit columns
    fn columns(&self) -> Vec<(&'static str, QueryValue)>;

    fn named_queries() -> &'static [NamedQuery] {
        &[]
    }

    /// The embedded audit block, for entities that track one
    fn audit(&self) -> Option<&AuditInfo> {
        None
    }

    fn audit_mut(&mut self) -> Option<&mut AuditInfo> {
        None
    }
}
