// ABOUTME: Data access layer for CloudTrain
// ABOUTME: Generic repository over SQLite with named queries, pagination and audit stamping

pub mod audit;
pub mod db;
pub mod entity;
pub mod error;
pub mod page;
pub mod query;
pub mod repository;

pub use audit::{AuditInfo, AuditListener, AUDIT_USER_ID_MAX_LEN};
pub use db::{connect, init, run_migrations};
pub use entity::{Entity, NamedQuery};
pub use error::{StorageError, StorageResult};
pub use page::{
    Page, PageCriteria, QueryParameter, QueryParametersBuilder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use query::{
    BoundQuery, IndexedQueryParametersBuilder, NamedQueryParametersBuilder, QueryParameters,
    QueryValue,
};
pub use repository::{GenericRepository, Repository};
