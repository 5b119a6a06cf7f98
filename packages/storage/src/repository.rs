// ABOUTME: Generic repository executing CRUD and named queries for any Entity over SQLite
// ABOUTME: Applies optimistic locking on update/delete and stamps audit blocks around writes

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use cloudtrain_core::Principal;

use crate::audit::AuditListener;
use crate::entity::{Entity, NamedQuery};
use crate::error::{StorageError, StorageResult};
use crate::page::{Page, PageCriteria};
use crate::query::{BoundQuery, QueryParameters, QueryValue};

/// Data access facade for one entity type
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Insert a new entity. With `refresh` the stored row is read back into `entity`.
    async fn add_entity(
        &self,
        principal: &Principal,
        entity: &mut T,
        refresh: bool,
    ) -> StorageResult<()>;

    async fn get_entity_by_id(&self, id: &T::Key) -> StorageResult<Option<T>>;

    async fn get_required_entity_by_id(&self, id: &T::Key) -> StorageResult<T>;

    /// Write the entity's state if its version still matches the stored one
    async fn set_entity(&self, principal: &Principal, entity: &mut T) -> StorageResult<()>;

    /// Delete the entity if its version still matches the stored one
    async fn remove_entity(&self, entity: &T) -> StorageResult<()>;

    /// Delete by key without a version check. Absent keys are ignored.
    async fn remove_entity_by_id(&self, id: &T::Key) -> StorageResult<()>;

    async fn query_entity(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<Option<T>>;

    async fn query_required_entity(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<T>;

    async fn query_entities(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<Vec<T>>;

    async fn count_entities(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<i64>;

    async fn query_entities_with_pagination(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
        offset: i64,
        page_size: i64,
    ) -> StorageResult<Vec<T>>;

    async fn query_page(
        &self,
        query_name: &str,
        count_query_name: &str,
        criteria: &PageCriteria,
    ) -> StorageResult<Page<T>>;
}

/// [`Repository`] implementation over a SQLite pool.
///
/// Named queries are looked up in a registry filled by [`GenericRepository::with_entity`].
#[derive(Clone)]
pub struct GenericRepository {
    pool: SqlitePool,
    named_queries: HashMap<&'static str, &'static str>,
}

impl GenericRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            named_queries: HashMap::new(),
        }
    }

    /// Register the named queries of an entity type
    pub fn with_entity<T: Entity>(mut self) -> Self {
        for query in T::named_queries() {
            self.register(*query);
        }
        self
    }

    pub fn with_named_query(mut self, query: NamedQuery) -> Self {
        self.register(query);
        self
    }

    fn register(&mut self, query: NamedQuery) {
        debug!("Registering named query {}", query.name);
        self.named_queries.insert(query.name, query.sql);
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn named_query(&self, query_name: &str) -> StorageResult<&'static str> {
        self.named_queries
            .get(query_name)
            .copied()
            .ok_or_else(|| StorageError::UnknownQuery(query_name.to_string()))
    }

    fn bind_named_query(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<BoundQuery> {
        let sql = self.named_query(query_name)?;
        match params {
            Some(params) => params.apply(sql),
            None => Ok(BoundQuery::new(sql)),
        }
    }

    pub async fn add_entity<T: Entity>(
        &self,
        principal: &Principal,
        entity: &mut T,
        refresh: bool,
    ) -> StorageResult<()> {
        let key = entity
            .key()
            .ok_or(StorageError::MissingKey(T::ENTITY_NAME))?;
        debug!("Adding {} {}", T::ENTITY_NAME, key);

        entity.set_version(0);
        AuditListener::on_pre_persist(entity, principal, Utc::now());

        let mut columns: Vec<(&'static str, QueryValue)> = vec![(T::KEY_COLUMN, key.clone().into())];
        columns.extend(entity.columns());
        columns.push((T::VERSION_COLUMN, QueryValue::Int(0)));
        if let Some(audit) = entity.audit() {
            columns.extend(audit.insert_columns());
        }

        let names = columns
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let mut bound = BoundQuery::new(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE_NAME,
            names,
            placeholders
        ));
        for (_, value) in &columns {
            bound.push(value)?;
        }

        let (sql, arguments) = bound.into_parts();
        sqlx::query_with(&sql, arguments)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StorageError::DuplicateKey {
                        entity: T::ENTITY_NAME,
                        key: key.to_string(),
                    }
                }
                other => StorageError::Sqlx(other),
            })?;

        if refresh {
            *entity = self.get_required_entity_by_id::<T>(&key).await?;
        }
        Ok(())
    }

    pub async fn get_entity_by_id<T: Entity>(&self, id: &T::Key) -> StorageResult<Option<T>> {
        debug!("Fetching {} {}", T::ENTITY_NAME, id);

        let mut bound = BoundQuery::new(format!(
            "SELECT * FROM {} WHERE {} = ?1",
            T::TABLE_NAME,
            T::KEY_COLUMN
        ));
        bound.push(&id.clone().into())?;

        let (sql, arguments) = bound.into_parts();
        sqlx::query_as_with::<_, T, _>(&sql, arguments)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn get_required_entity_by_id<T: Entity>(&self, id: &T::Key) -> StorageResult<T> {
        self.get_entity_by_id::<T>(id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: T::ENTITY_NAME,
                key: id.to_string(),
            })
    }

    pub async fn set_entity<T: Entity>(
        &self,
        principal: &Principal,
        entity: &mut T,
    ) -> StorageResult<()> {
        let key = entity
            .key()
            .ok_or(StorageError::MissingKey(T::ENTITY_NAME))?;
        let expected = entity.version();
        debug!(
            "Updating {} {} at version {}",
            T::ENTITY_NAME,
            key,
            expected
        );

        let unstamped = entity.audit().cloned();
        AuditListener::on_pre_update(entity, principal, Utc::now());

        let mut columns = entity.columns();
        if let Some(audit) = entity.audit() {
            columns.extend(audit.update_columns());
        }

        let mut assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("{} = ?{}", name, i + 1))
            .collect();
        assignments.push(format!(
            "{} = {} + 1",
            T::VERSION_COLUMN,
            T::VERSION_COLUMN
        ));

        let mut bound = BoundQuery::new(format!(
            "UPDATE {} SET {} WHERE {} = ?{} AND {} = ?{}",
            T::TABLE_NAME,
            assignments.join(", "),
            T::KEY_COLUMN,
            columns.len() + 1,
            T::VERSION_COLUMN,
            columns.len() + 2
        ));
        for (_, value) in &columns {
            bound.push(value)?;
        }
        bound.push(&key.clone().into())?;
        bound.push(&QueryValue::Int(expected))?;

        let (sql, arguments) = bound.into_parts();
        let outcome = match sqlx::query_with(&sql, arguments).execute(&self.pool).await {
            Ok(result) if result.rows_affected() > 0 => Ok(()),
            Ok(_) => Err(self.stale_write_error::<T>(&key, expected).await),
            Err(e) => Err(StorageError::Sqlx(e)),
        };

        match outcome {
            Ok(()) => {
                entity.set_version(expected + 1);
                Ok(())
            }
            Err(e) => {
                // the caller keeps the audit block it passed in
                if let (Some(audit), Some(unstamped)) = (entity.audit_mut(), unstamped) {
                    *audit = unstamped;
                }
                Err(e)
            }
        }
    }

    pub async fn remove_entity<T: Entity>(&self, entity: &T) -> StorageResult<()> {
        let key = entity
            .key()
            .ok_or(StorageError::MissingKey(T::ENTITY_NAME))?;
        let expected = entity.version();
        debug!(
            "Removing {} {} at version {}",
            T::ENTITY_NAME,
            key,
            expected
        );

        let mut bound = BoundQuery::new(format!(
            "DELETE FROM {} WHERE {} = ?1 AND {} = ?2",
            T::TABLE_NAME,
            T::KEY_COLUMN,
            T::VERSION_COLUMN
        ));
        bound.push(&key.clone().into())?;
        bound.push(&QueryValue::Int(expected))?;

        let (sql, arguments) = bound.into_parts();
        let result = sqlx::query_with(&sql, arguments)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(self.stale_write_error::<T>(&key, expected).await);
        }
        Ok(())
    }

    pub async fn remove_entity_by_id<T: Entity>(&self, id: &T::Key) -> StorageResult<()> {
        let mut bound = BoundQuery::new(format!(
            "DELETE FROM {} WHERE {} = ?1",
            T::TABLE_NAME,
            T::KEY_COLUMN
        ));
        bound.push(&id.clone().into())?;

        let (sql, arguments) = bound.into_parts();
        let result = sqlx::query_with(&sql, arguments)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        debug!(
            "Removed {} {} ({} rows)",
            T::ENTITY_NAME,
            id,
            result.rows_affected()
        );
        Ok(())
    }

    /// Tell a lost optimistic lock apart from a row that no longer exists
    async fn stale_write_error<T: Entity>(&self, key: &T::Key, expected: i64) -> StorageError {
        let mut bound = BoundQuery::new(format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            T::VERSION_COLUMN,
            T::TABLE_NAME,
            T::KEY_COLUMN
        ));
        if let Err(e) = bound.push(&key.clone().into()) {
            return e;
        }

        let (sql, arguments) = bound.into_parts();
        match sqlx::query_scalar_with::<_, i64, _>(&sql, arguments)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(actual)) => StorageError::OptimisticLock {
                entity: T::ENTITY_NAME,
                key: key.to_string(),
                expected,
                actual,
            },
            Ok(None) => StorageError::NotFound {
                entity: T::ENTITY_NAME,
                key: key.to_string(),
            },
            Err(e) => StorageError::Sqlx(e),
        }
    }

    pub async fn query_entities<T: Entity>(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<Vec<T>> {
        debug!("Running named query {}", query_name);
        let bound = self.bind_named_query(query_name, params)?;
        self.fetch_all::<T>(bound).await
    }

    pub async fn query_entity<T: Entity>(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<Option<T>> {
        let mut entities = self.query_entities::<T>(query_name, params).await?;
        match entities.len() {
            0 => Ok(None),
            1 => Ok(entities.pop()),
            found => Err(StorageError::NonUniqueResult {
                query: query_name.to_string(),
                found,
            }),
        }
    }

    pub async fn query_required_entity<T: Entity>(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<T> {
        self.query_entity::<T>(query_name, params)
            .await?
            .ok_or_else(|| StorageError::NoResult {
                query: query_name.to_string(),
            })
    }

    pub async fn count_entities(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<i64> {
        debug!("Running count query {}", query_name);
        let (sql, arguments) = self.bind_named_query(query_name, params)?.into_parts();
        sqlx::query_scalar_with::<_, i64, _>(&sql, arguments)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn query_entities_with_pagination<T: Entity>(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
        offset: i64,
        page_size: i64,
    ) -> StorageResult<Vec<T>> {
        if offset < 0 {
            return Err(StorageError::InvalidInput(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }
        if page_size <= 0 {
            return Err(StorageError::InvalidInput(format!(
                "page size must be positive, got {}",
                page_size
            )));
        }

        debug!(
            "Running named query {} (offset: {}, page size: {})",
            query_name, offset, page_size
        );
        let bound = self
            .bind_named_query(query_name, params)?
            .with_window(offset, page_size)?;
        self.fetch_all::<T>(bound).await
    }

    pub async fn query_page<T: Entity>(
        &self,
        query_name: &str,
        count_query_name: &str,
        criteria: &PageCriteria,
    ) -> StorageResult<Page<T>> {
        let params = criteria.to_query_parameters();
        let elements = self
            .query_entities_with_pagination::<T>(
                query_name,
                params.as_ref(),
                criteria.first_position,
                criteria.page_size,
            )
            .await?;

        let number_of_elements = if criteria.first_position == 0 {
            self.count_entities(count_query_name, params.as_ref())
                .await?
        } else {
            criteria.first_position + elements.len() as i64
        };

        Ok(Page::new(
            elements,
            criteria.first_position,
            number_of_elements,
        ))
    }

    async fn fetch_all<T: Entity>(&self, bound: BoundQuery) -> StorageResult<Vec<T>> {
        let (sql, arguments) = bound.into_parts();
        sqlx::query_as_with::<_, T, _>(&sql, arguments)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for GenericRepository {
    async fn add_entity(
        &self,
        principal: &Principal,
        entity: &mut T,
        refresh: bool,
    ) -> StorageResult<()> {
        GenericRepository::add_entity::<T>(self, principal, entity, refresh).await
    }

    async fn get_entity_by_id(&self, id: &T::Key) -> StorageResult<Option<T>> {
        GenericRepository::get_entity_by_id::<T>(self, id).await
    }

    async fn get_required_entity_by_id(&self, id: &T::Key) -> StorageResult<T> {
        GenericRepository::get_required_entity_by_id::<T>(self, id).await
    }

    async fn set_entity(&self, principal: &Principal, entity: &mut T) -> StorageResult<()> {
        GenericRepository::set_entity::<T>(self, principal, entity).await
    }

    async fn remove_entity(&self, entity: &T) -> StorageResult<()> {
        GenericRepository::remove_entity::<T>(self, entity).await
    }

    async fn remove_entity_by_id(&self, id: &T::Key) -> StorageResult<()> {
        GenericRepository::remove_entity_by_id::<T>(self, id).await
    }

    async fn query_entity(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<Option<T>> {
        GenericRepository::query_entity::<T>(self, query_name, params).await
    }

    async fn query_required_entity(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<T> {
        GenericRepository::query_required_entity::<T>(self, query_name, params).await
    }

    async fn query_entities(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<Vec<T>> {
        GenericRepository::query_entities::<T>(self, query_name, params).await
    }

    async fn count_entities(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
    ) -> StorageResult<i64> {
        GenericRepository::count_entities(self, query_name, params).await
    }

    async fn query_entities_with_pagination(
        &self,
        query_name: &str,
        params: Option<&QueryParameters>,
        offset: i64,
        page_size: i64,
    ) -> StorageResult<Vec<T>> {
        GenericRepository::query_entities_with_pagination::<T>(
            self, query_name, params, offset, page_size,
        )
        .await
    }

    async fn query_page(
        &self,
        query_name: &str,
        count_query_name: &str,
        criteria: &PageCriteria,
    ) -> StorageResult<Page<T>> {
        GenericRepository::query_page::<T>(self, query_name, count_query_name, criteria).await
    }
}
