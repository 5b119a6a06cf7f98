// ABOUTME: Error types for the data access layer
// ABOUTME: Keeps not-found, concurrency conflicts and store faults distinguishable for callers

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Missing required entity of type [{entity}] with unique identifier [{key}]")]
    NotFound { entity: &'static str, key: String },

    #[error("Expected query [{query}] to find exactly one entity but actually found none")]
    NoResult { query: String },

    #[error("Expected query [{query}] to find at most one entity but found {found}")]
    NonUniqueResult { query: String, found: usize },

    #[error(
        "Entity [{entity}] with unique identifier [{key}] has been modified concurrently \
         (expected version {expected}, stored version {actual})"
    )]
    OptimisticLock {
        entity: &'static str,
        key: String,
        expected: i64,
        actual: i64,
    },

    #[error("Entity [{entity}] with unique identifier [{key}] already exists")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("Entity [{0}] has no unique identifier assigned")]
    MissingKey(&'static str),

    #[error("Unknown named query: {0}")]
    UnknownQuery(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// True for errors that mean "the requested row does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound { .. } | StorageError::NoResult { .. }
        )
    }

    /// True for errors a caller may resolve by re-reading and retrying
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::OptimisticLock { .. } | StorageError::DuplicateKey { .. }
        )
    }
}
