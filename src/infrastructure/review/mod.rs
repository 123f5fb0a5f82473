//! Storage-backed review repositories

mod history_repository;
mod workflow_repository;

pub use history_repository::StorageHistoryRepository;
pub use workflow_repository::StorageWorkflowRepository;
