//! Profile directory implementations

mod cached_directory;
mod in_memory;
mod postgres_directory;

pub use cached_directory::CachedUserDirectory;
pub use in_memory::InMemoryUserDirectory;
pub use postgres_directory::PostgresUserDirectory;
