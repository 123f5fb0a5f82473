//! Migrate command - applies (or reverts) the review schema

use anyhow::{bail, Context};
use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::{
    review_migrations, run_review_migrations, PostgresMigrator, StorageConfig,
};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead of applying
    #[arg(long)]
    pub revert_last: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging)?;

    let storage = config
        .storage
        .to_storage_config()
        .map_err(anyhow::Error::msg)?;

    let StorageConfig::Postgres(postgres) = storage else {
        bail!("Migrations require storage.backend = \"postgres\"");
    };

    let pool = postgres
        .connect()
        .await
        .context("Failed to connect to Postgres")?;

    if args.revert_last {
        let migrator = PostgresMigrator::new(pool);
        let current = migrator.current_version().await?;

        let Some(migration) = review_migrations()
            .into_iter()
            .find(|m| Some(m.version) == current)
        else {
            info!("No migration to revert");
            return Ok(());
        };

        migrator.revert_migration(&migration).await?;
        info!(version = migration.version, "Reverted migration");
        return Ok(());
    }

    let applied = run_review_migrations(&pool).await?;
    info!(applied, "Migrations complete");

    Ok(())
}
