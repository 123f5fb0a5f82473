//! Storage infrastructure - document storage backends

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryStorage;
pub use migrations::{review_migrations, run_review_migrations, Migration, PostgresMigrator};
pub use postgres::{PostgresConfig, PostgresStorage};

/// Table holding workflow record documents
pub const WORKFLOW_TABLE: &str = "review_workflows";

/// Table holding history ledger documents
pub const HISTORY_TABLE: &str = "review_history";

/// Profile table read by the user directory
pub const PROFILE_TABLE: &str = "profiles";
