//! Append-only history ledger over generic document storage

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::review::{HistoryEntry, HistoryFilter, HistoryRepository, Page, PageRequest};
use crate::domain::storage::{DocumentQuery, SortDirection, Storage};
use crate::domain::DomainError;

/// Translate a ledger filter into a newest-first document query
fn history_query(filter: &HistoryFilter) -> DocumentQuery {
    let mut query = DocumentQuery::new();

    if let Some((item_type, ref item_id)) = filter.item {
        query = query
            .equals("itemType", item_type.as_str())
            .equals("itemId", item_id.as_str());
    }

    if let Some(ref item_id) = filter.item_id {
        query = query.equals("itemId", item_id.as_str());
    }

    if let Some(ref engagement) = filter.engagement {
        query = query.equals("engagement", engagement.as_str());
    }

    if let Some(ref user_id) = filter.performed_by {
        query = query.equals("performedBy", user_id.as_str());
    }

    if let Some(action) = filter.action {
        query = query.equals("action", action.as_str());
    }

    if let Some(since) = filter.since {
        query = query.since("performedAt", since);
    }

    query.order_by("performedAt", SortDirection::Descending)
}

/// Storage-backed implementation of [`HistoryRepository`]
#[derive(Debug)]
pub struct StorageHistoryRepository {
    storage: Arc<dyn Storage<HistoryEntry>>,
}

impl StorageHistoryRepository {
    pub fn new(storage: Arc<dyn Storage<HistoryEntry>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl HistoryRepository for StorageHistoryRepository {
    async fn append(&self, entry: HistoryEntry) -> Result<HistoryEntry, DomainError> {
        self.storage.create(entry).await
    }

    async fn list(&self, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>, DomainError> {
        self.storage.query(&history_query(filter)).await
    }

    async fn list_limited(
        &self,
        filter: &HistoryFilter,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, DomainError> {
        self.storage
            .query(&history_query(filter).limit(limit))
            .await
    }

    async fn list_page(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<Page<HistoryEntry>, DomainError> {
        let query = history_query(filter);
        let total_count = self.storage.count_matching(&query).await?;

        let items = self
            .storage
            .query(&query.offset(page.offset()).limit(page.limit))
            .await?;

        Ok(Page::from_parts(items, total_count, page))
    }
}
