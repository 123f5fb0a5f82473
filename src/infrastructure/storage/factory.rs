//! Runtime selection of the storage backend

use std::sync::Arc;

use sqlx::postgres::PgPool;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    InMemory,
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Builds storages for every entity kind against one backend.
///
/// All Postgres storages share a single pool.
#[derive(Debug, Clone)]
pub enum StorageFactory {
    InMemory,
    Postgres(PgPool),
}

impl StorageFactory {
    pub async fn connect(config: &StorageConfig) -> Result<Self, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Self::InMemory),
            StorageConfig::Postgres(pg) => Ok(Self::Postgres(pg.connect().await?)),
        }
    }

    /// Storage for entity `E`; `table_name` is ignored by the in-memory backend
    pub fn create<E>(&self, table_name: &str) -> Arc<dyn Storage<E>>
    where
        E: StorageEntity + 'static,
    {
        match self {
            Self::InMemory => Arc::new(InMemoryStorage::<E>::new()),
            Self::Postgres(pool) => Arc::new(PostgresStorage::<E>::new(pool.clone(), table_name)),
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::InMemory => None,
            Self::Postgres(pool) => Some(pool),
        }
    }

    /// Round-trip to the backend, used by the readiness probe
    pub async fn ping(&self) -> Result<(), DomainError> {
        match self {
            Self::InMemory => Ok(()),
            Self::Postgres(pool) => sqlx::query("SELECT 1")
                .execute(pool)
                .await
                .map(|_| ())
                .map_err(|e| DomainError::storage(format!("Database unreachable: {}", e))),
        }
    }
}
