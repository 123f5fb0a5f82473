//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;
use super::query::DocumentQuery;

/// Predicate used to narrow a listing
pub type EntityFilter<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// Generic document storage for any entity type
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Retrieves the entities accepted by `filter`
    async fn list_where(&self, filter: EntityFilter<'_, E>) -> Result<Vec<E>, DomainError> {
        Ok(self.list().await?.into_iter().filter(|e| filter(e)).collect())
    }

    /// Entities matching `query`, ordered and sliced as it requests.
    ///
    /// The default evaluates the query over [`Storage::list`]; backends that
    /// can filter at the source override it.
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<E>, DomainError> {
        query.apply(self.list().await?)
    }

    /// Number of entities matching the conditions of `query`, ignoring paging
    async fn count_matching(&self, query: &DocumentQuery) -> Result<usize, DomainError> {
        Ok(query.unpaged().apply(self.list().await?)?.len())
    }

    /// Inserts a new entity, `Conflict` if the key is taken
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Replaces an existing entity, `NotFound` if absent
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Deletes an entity by its key, returns true if something was removed
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}
