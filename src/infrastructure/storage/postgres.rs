//! PostgreSQL document storage over a shared `sqlx` pool

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Row};

use crate::domain::storage::{
    DocumentQuery, FieldCondition, SortDirection, Storage, StorageEntity, StorageKey,
};
use crate::domain::DomainError;

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/engagement_review".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Open a pool with these settings
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// Stores each entity as a JSONB document keyed by its storage key.
///
/// Tables are created by the migrations in [`super::migrations`].
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: String,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("kind", &E::KIND)
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn decode(&self, data: serde_json::Value) -> Result<E, DomainError> {
        serde_json::from_value(data).map_err(|e| {
            DomainError::storage(format!("Failed to deserialize {}: {}", E::KIND, e))
        })
    }

    fn encode(&self, entity: &E) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(entity)
            .map_err(|e| DomainError::storage(format!("Failed to serialize {}: {}", E::KIND, e)))
    }
}

/// Append `WHERE` clauses for the query's conditions. Field names are
/// compile-time constants; values are always bound.
fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &DocumentQuery) {
    for (i, condition) in query.conditions.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });

        match condition {
            FieldCondition::OneOf { field, values } if values.len() == 1 => {
                builder.push(format!("(data->>'{}') = ", field));
                builder.push_bind(values[0].clone());
            }
            FieldCondition::OneOf { field, values } => {
                builder.push(format!("(data->>'{}') = ANY(", field));
                builder.push_bind(values.clone());
                builder.push(")");
            }
            FieldCondition::Since { field, at } => {
                builder.push(format!("(data->>'{}')::timestamptz >= ", field));
                builder.push_bind(*at);
            }
        }
    }
}

fn push_order_and_page(builder: &mut QueryBuilder<'_, Postgres>, query: &DocumentQuery) {
    if let Some((field, direction)) = query.order_by {
        let direction = match direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        builder.push(format!(
            " ORDER BY (data->>'{}')::timestamptz {}, key",
            field, direction
        ));
    }

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    if query.offset > 0 {
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));
    }
}

/// `SELECT data` statement for a document query
fn select_sql(table_name: &str, query: &DocumentQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT data FROM {}", table_name));
    push_conditions(&mut builder, query);
    push_order_and_page(&mut builder, query);
    builder
}

/// `SELECT COUNT(*)` statement over the query's conditions
fn count_sql(table_name: &str, query: &DocumentQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", table_name));
    push_conditions(&mut builder, query);
    builder
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db) if db.is_unique_violation()
    )
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let query = format!("SELECT data FROM {} WHERE key = $1", self.table_name);

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get {}: {}", E::KIND, e)))?;

        row.map(|row| self.decode(row.get("data"))).transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let query = format!("SELECT data FROM {} ORDER BY created_at", self.table_name);

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list {}: {}", E::KIND, e)))?;

        rows.into_iter()
            .map(|row| self.decode(row.get("data")))
            .collect()
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<E>, DomainError> {
        let mut builder = select_sql(&self.table_name, query);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query {}: {}", E::KIND, e)))?;

        rows.into_iter()
            .map(|row| self.decode(row.get("data")))
            .collect()
    }

    async fn count_matching(&self, query: &DocumentQuery) -> Result<usize, DomainError> {
        let mut builder = count_sql(&self.table_name, query);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count {}: {}", E::KIND, e)))?;

        Ok(count.max(0) as usize)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = self.encode(&entity)?;
        let query = format!(
            "INSERT INTO {} (key, data) VALUES ($1, $2)",
            self.table_name
        );

        sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::conflict(format!("{} '{}' already exists", E::KIND, key))
                } else {
                    DomainError::storage(format!("Failed to create {}: {}", E::KIND, e))
                }
            })?;

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let data = self.encode(&entity)?;
        let query = format!(
            "UPDATE {} SET data = $2, updated_at = NOW() WHERE key = $1",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&key)
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update {}: {}", E::KIND, e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "{} '{}' not found",
                E::KIND,
                key
            )));
        }

        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let query = format!("DELETE FROM {} WHERE key = $1", self.table_name);

        let result = sqlx::query(&query)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete {}: {}", E::KIND, e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE key = $1)",
            self.table_name
        );

        sqlx::query_scalar(&query)
            .bind(key.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check {}: {}", E::KIND, e)))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table_name);

        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count {}: {}", E::KIND, e)))?;

        Ok(count as usize)
    }
}
