//! Repository traits for workflow records and the history ledger

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::history::HistoryEntry;
use super::item_type::ItemType;
use super::query::{HistoryFilter, Page, PageRequest, WorkflowFilter};
use super::status::HistoryAction;
use super::workflow::{WorkflowId, WorkflowRecord};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Durable store holding one workflow record per (item type, item id)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Get a record by ID
    async fn get(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, DomainError>;

    /// Get the record reviewing a given item
    async fn find_by_item(
        &self,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<Option<WorkflowRecord>, DomainError>;

    /// Return the record for the item, creating it in `in-progress` if absent
    async fn get_or_create(
        &self,
        item_type: ItemType,
        item_id: &str,
        engagement: &str,
    ) -> Result<WorkflowRecord, DomainError>;

    /// Insert a new record; `Conflict` if the item already has one
    async fn create(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError>;

    /// Persist a record, applying the lock invariant first
    async fn save(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError>;

    /// Hard delete; returns true if a record was removed
    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError>;

    /// List records matching the filter, oldest first
    async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<WorkflowRecord>, DomainError>;

    /// One page of matching records, most recently updated first
    async fn list_page(
        &self,
        filter: &WorkflowFilter,
        page: PageRequest,
    ) -> Result<Page<WorkflowRecord>, DomainError> {
        let mut records = self.list(filter).await?;
        records.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(Page::from_sorted(records, page))
    }
}

/// Append-only audit trail. There is intentionally no update or delete.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Append an entry
    async fn append(&self, entry: HistoryEntry) -> Result<HistoryEntry, DomainError>;

    /// List entries matching the filter, newest first
    async fn list(&self, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>, DomainError>;

    /// The newest `limit` entries matching the filter
    async fn list_limited(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        let mut entries = self.list(filter).await?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// One page of matching entries, newest first
    async fn list_page(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<Page<HistoryEntry>, DomainError> {
        Ok(Page::from_sorted(self.list(filter).await?, page))
    }

    async fn list_by_item(
        &self,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        self.list(&HistoryFilter::new().for_item(item_type, item_id))
            .await
    }

    async fn list_by_engagement(
        &self,
        engagement: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        self.list_limited(&HistoryFilter::new().with_engagement(engagement), limit)
            .await
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        self.list_limited(&HistoryFilter::new().with_performed_by(user_id), limit)
            .await
    }

    async fn list_by_action(
        &self,
        action: HistoryAction,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        self.list_limited(&HistoryFilter::new().with_action(action), limit)
            .await
    }

    /// Entries performed within the last `hours`
    async fn list_recent(
        &self,
        hours: i64,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        let since = Duration::try_hours(hours)
            .filter(|window| *window >= Duration::zero())
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| {
                DomainError::validation(format!("Invalid history window: {} hours", hours))
            })?;

        self.list_limited(&HistoryFilter::new().since(since), limit)
            .await
    }
}
