//! Workflow record repository over generic document storage

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::review::{
    ItemType, Page, PageRequest, WorkflowFilter, WorkflowId, WorkflowRecord, WorkflowRepository,
};
use crate::domain::storage::{DocumentQuery, SortDirection, Storage};
use crate::domain::DomainError;

/// Translate a listing filter into a document query over the record's wire fields
fn workflow_query(filter: &WorkflowFilter) -> DocumentQuery {
    let mut query = DocumentQuery::new();

    if let Some(ref statuses) = filter.statuses {
        query = query.one_of("status", statuses.iter().map(|s| s.as_str()));
    }

    if let Some(ref engagement) = filter.engagement {
        query = query.equals("engagement", engagement.as_str());
    }

    if let Some(ref reviewer) = filter.reviewer {
        query = query.equals("assignedReviewer", reviewer.as_str());
    }

    if let Some(item_type) = filter.item_type {
        query = query.equals("itemType", item_type.as_str());
    }

    if let Some(ref item_id) = filter.item_id {
        query = query.equals("itemId", item_id.as_str());
    }

    query
}

/// Storage-backed implementation of [`WorkflowRepository`]
///
/// Creation paths run under a write guard so that two submissions for the same
/// item in this process cannot both insert a record. Across processes the
/// unique index on (itemType, itemId) turns the loser's insert into a
/// `Conflict`, which `get_or_create` answers by re-reading the winner's record.
#[derive(Debug)]
pub struct StorageWorkflowRepository {
    storage: Arc<dyn Storage<WorkflowRecord>>,
    write_guard: Mutex<()>,
}

impl StorageWorkflowRepository {
    pub fn new(storage: Arc<dyn Storage<WorkflowRecord>>) -> Self {
        Self {
            storage,
            write_guard: Mutex::new(()),
        }
    }

    async fn lookup(
        &self,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<Option<WorkflowRecord>, DomainError> {
        let query = workflow_query(
            &WorkflowFilter::new()
                .with_item_type(item_type)
                .with_item_id(item_id),
        )
        .order_by("createdAt", SortDirection::Ascending)
        .limit(1);

        Ok(self.storage.query(&query).await?.into_iter().next())
    }
}

#[async_trait]
impl WorkflowRepository for StorageWorkflowRepository {
    async fn get(&self, id: &WorkflowId) -> Result<Option<WorkflowRecord>, DomainError> {
        self.storage.get(id).await
    }

    async fn find_by_item(
        &self,
        item_type: ItemType,
        item_id: &str,
    ) -> Result<Option<WorkflowRecord>, DomainError> {
        self.lookup(item_type, item_id).await
    }

    async fn get_or_create(
        &self,
        item_type: ItemType,
        item_id: &str,
        engagement: &str,
    ) -> Result<WorkflowRecord, DomainError> {
        let _guard = self.write_guard.lock().await;

        if let Some(existing) = self.lookup(item_type, item_id).await? {
            return Ok(existing);
        }

        match self
            .storage
            .create(WorkflowRecord::new(item_type, item_id, engagement))
            .await
        {
            Ok(created) => {
                debug!(workflow_id = %created.id(), %item_type, item_id, "Created workflow record");
                Ok(created)
            }
            Err(DomainError::Conflict { .. }) => {
                self.lookup(item_type, item_id).await?.ok_or_else(|| {
                    DomainError::internal(format!(
                        "Workflow for {} '{}' vanished after a conflicting insert",
                        item_type, item_id
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn create(&self, record: WorkflowRecord) -> Result<WorkflowRecord, DomainError> {
        let _guard = self.write_guard.lock().await;

        if self
            .lookup(record.item_type(), record.item_id())
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "A workflow already exists for {} '{}'",
                record.item_type(),
                record.item_id()
            )));
        }

        self.storage.create(record).await
    }

    async fn save(&self, mut record: WorkflowRecord) -> Result<WorkflowRecord, DomainError> {
        record.enforce_lock_invariant(Utc::now());
        self.storage.update(record).await
    }

    async fn delete(&self, id: &WorkflowId) -> Result<bool, DomainError> {
        self.storage.delete(id).await
    }

    async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<WorkflowRecord>, DomainError> {
        let query = workflow_query(filter).order_by("createdAt", SortDirection::Ascending);
        self.storage.query(&query).await
    }

    async fn list_page(
        &self,
        filter: &WorkflowFilter,
        page: PageRequest,
    ) -> Result<Page<WorkflowRecord>, DomainError> {
        let query = workflow_query(filter);
        let total_count = self.storage.count_matching(&query).await?;

        let items = self
            .storage
            .query(
                &query
                    .order_by("updatedAt", SortDirection::Descending)
                    .offset(page.offset())
                    .limit(page.limit),
            )
            .await?;

        Ok(Page::from_parts(items, total_count, page))
    }
}
