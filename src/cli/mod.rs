//! CLI module for the engagement review service
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply the Postgres schema and exit

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// Engagement Review - review and sign-off workflow for audit artifacts
#[derive(Parser)]
#[command(name = "engagement-review")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply database migrations
    Migrate(migrate::MigrateArgs),
}
