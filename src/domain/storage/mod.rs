//! Storage domain - document storage abstraction shared by the review repositories

mod entity;
mod query;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use query::{DocumentQuery, FieldCondition, SortDirection};
pub use repository::{EntityFilter, Storage};

#[cfg(test)]
pub use repository::mock;
