//! Schema migrations for the review tables

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Applies and reverts versioned SQL migrations, tracked in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Apply one migration inside a transaction; returns false if already applied
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let fail = |e: sqlx::Error| {
            DomainError::storage(format!("Migration {} failed: {}", migration.version, e))
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        tx.commit().await.map_err(fail)?;

        info!(version = migration.version, description = migration.description, "Applied migration");
        Ok(true)
    }

    /// Revert one migration; returns false if it was not applied
    pub async fn revert_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let fail = |e: sqlx::Error| {
            DomainError::storage(format!("Revert of migration {} failed: {}", migration.version, e))
        };

        let mut tx = self.pool.begin().await.map_err(fail)?;

        sqlx::raw_sql(migration.down)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(fail)?;

        tx.commit().await.map_err(fail)?;

        info!(version = migration.version, "Reverted migration");
        Ok(true)
    }

    /// Latest applied version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// A versioned schema change
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

/// Review schema, in application order
pub fn review_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create review_workflows table",
            up: r#"
            CREATE TABLE IF NOT EXISTS review_workflows (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_review_workflows_item
                ON review_workflows ((data->>'itemType'), (data->>'itemId'));
            CREATE INDEX IF NOT EXISTS idx_review_workflows_engagement
                ON review_workflows ((data->>'engagement'));
            CREATE INDEX IF NOT EXISTS idx_review_workflows_status
                ON review_workflows ((data->>'status'));
            "#,
            down: "DROP TABLE IF EXISTS review_workflows;",
        },
        Migration {
            version: 2,
            description: "Create review_history table",
            up: r#"
            CREATE TABLE IF NOT EXISTS review_history (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_review_history_item
                ON review_history ((data->>'itemType'), (data->>'itemId'));
            CREATE INDEX IF NOT EXISTS idx_review_history_engagement
                ON review_history ((data->>'engagement'));
            CREATE INDEX IF NOT EXISTS idx_review_history_created_at
                ON review_history (created_at);
            "#,
            down: "DROP TABLE IF EXISTS review_history;",
        },
        Migration {
            version: 3,
            description: "Create profiles table",
            up: r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id VARCHAR(255) PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                role VARCHAR(32) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_profiles_role ON profiles (role);
            "#,
            down: "DROP TABLE IF EXISTS profiles;",
        },
        Migration {
            version: 4,
            description: "Index reviewer, actor and action lookups",
            up: r#"
            CREATE INDEX IF NOT EXISTS idx_review_workflows_reviewer
                ON review_workflows ((data->>'assignedReviewer'));
            CREATE INDEX IF NOT EXISTS idx_review_history_performed_by
                ON review_history ((data->>'performedBy'));
            CREATE INDEX IF NOT EXISTS idx_review_history_action
                ON review_history ((data->>'action'));
            "#,
            down: r#"
            DROP INDEX IF EXISTS idx_review_workflows_reviewer;
            DROP INDEX IF EXISTS idx_review_history_performed_by;
            DROP INDEX IF EXISTS idx_review_history_action;
            "#,
        },
    ]
}

/// Apply every pending review migration; returns how many ran
pub async fn run_review_migrations(pool: &PgPool) -> Result<usize, DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    let mut applied = 0;

    for migration in review_migrations() {
        if migrator.run_migration(&migration).await? {
            applied += 1;
        }
    }

    Ok(applied)
}
